use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn bin() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("scryptbox"));
    cmd.env_remove("SCRYPTBOX_MAX_TIME")
        .env_remove("SCRYPTBOX_MAX_MEM")
        .env_remove("SCRYPTBOX_MAX_MEM_FRAC")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn enc_writes_input_plus_128_bytes() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("message.txt");
    let output = dir.path().join("message.scrypt");
    fs::write(&input, b"message").unwrap();

    bin()
        .env("SCRYPTBOX_PASSWORD", "password")
        .args(["enc", "--max-time", "0.1"])
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    let blob = fs::read(&output).unwrap();
    assert_eq!(blob.len(), b"message".len() + 128);
    assert_eq!(&blob[..6], b"scrypt");
}

#[test]
fn enc_and_dec_roundtrip() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("message.txt");
    let encrypted = dir.path().join("message.scrypt");
    let decrypted = dir.path().join("message.out");
    fs::write(&input, b"attack at dawn").unwrap();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .args(["enc", "-t", "0.1"])
        .arg(&input)
        .arg(&encrypted)
        .assert()
        .success();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .arg("dec")
        .arg(&encrypted)
        .arg(&decrypted)
        .assert()
        .success();

    assert_eq!(fs::read(&decrypted).unwrap(), b"attack at dawn");
}

#[test]
fn dec_writes_to_stdout_by_default() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("message.txt");
    let encrypted = dir.path().join("message.scrypt");
    fs::write(&input, b"to stdout").unwrap();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .args(["enc", "-t", "0.1"])
        .arg(&input)
        .arg(&encrypted)
        .assert()
        .success();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .arg("dec")
        .arg(&encrypted)
        .assert()
        .success()
        .stdout(predicate::eq(&b"to stdout"[..]));
}

#[test]
fn enc_reads_stdin_when_input_is_dash() {
    let dir = tempdir().unwrap();
    let encrypted = dir.path().join("piped.scrypt");

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .args(["enc", "-t", "0.1", "-"])
        .arg(&encrypted)
        .write_stdin("piped data")
        .assert()
        .success();

    assert_eq!(fs::read(&encrypted).unwrap().len(), "piped data".len() + 128);
}

#[test]
fn password_can_be_piped() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("message.txt");
    let encrypted = dir.path().join("message.scrypt");
    fs::write(&input, b"message").unwrap();

    bin()
        .env_remove("SCRYPTBOX_PASSWORD")
        .args(["enc", "-t", "0.1"])
        .arg(&input)
        .arg(&encrypted)
        .write_stdin("pw\npw\n")
        .assert()
        .success();

    bin()
        .env_remove("SCRYPTBOX_PASSWORD")
        .arg("dec")
        .arg(&encrypted)
        .write_stdin("pw\n")
        .assert()
        .success()
        .stdout(predicate::eq(&b"message"[..]));
}

#[test]
fn piped_passwords_must_match() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("message.txt");
    fs::write(&input, b"message").unwrap();

    bin()
        .env_remove("SCRYPTBOX_PASSWORD")
        .arg("enc")
        .arg(&input)
        .write_stdin("pw\nother\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("passwords do not match"));
}

#[test]
fn wrong_password_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("message.txt");
    let encrypted = dir.path().join("message.scrypt");
    fs::write(&input, b"message").unwrap();

    bin()
        .env("SCRYPTBOX_PASSWORD", "correct")
        .args(["enc", "-t", "0.1"])
        .arg(&input)
        .arg(&encrypted)
        .assert()
        .success();

    bin()
        .env("SCRYPTBOX_PASSWORD", "wrong")
        .arg("dec")
        .arg(&encrypted)
        .assert()
        .failure()
        .stderr(predicate::str::contains("password is incorrect"));
}

#[test]
fn dec_rejects_garbage() {
    let dir = tempdir().unwrap();
    let garbage = dir.path().join("garbage.bin");
    fs::write(&garbage, vec![0u8; 256]).unwrap();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .arg("dec")
        .arg(&garbage)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized scrypt format"));
}

#[test]
fn dec_rejects_truncated_file() {
    let dir = tempdir().unwrap();
    let short = dir.path().join("short.scrypt");
    fs::write(&short, b"scrypt\0").unwrap();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .arg("dec")
        .arg(&short)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "data is not a valid scrypt-encrypted block",
        ));
}

#[test]
fn dec_with_too_little_memory_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("message.txt");
    let encrypted = dir.path().join("message.scrypt");
    fs::write(&input, b"message").unwrap();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .args(["enc", "-t", "0.1"])
        .arg(&input)
        .arg(&encrypted)
        .assert()
        .success();

    // Every container needs at least 128 * 2 * 8 bytes.
    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .args(["dec", "--max-mem", "1024"])
        .arg(&encrypted)
        .assert()
        .failure()
        .stderr(predicate::str::contains("too much memory"));
}

#[test]
fn enc_with_tiny_budget_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("message.txt");
    fs::write(&input, b"message").unwrap();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .args(["enc", "--max-mem", "1024"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scrypt parameters fit"));
}

#[test]
fn dec_missing_input_fails() {
    let dir = tempdir().unwrap();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .arg("dec")
        .arg(dir.path().join("missing.scrypt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading input file"));
}

#[test]
fn info_reports_parameters() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("message.txt");
    let encrypted = dir.path().join("message.scrypt");
    fs::write(&input, b"message").unwrap();

    bin()
        .env("SCRYPTBOX_PASSWORD", "pw")
        .args(["enc", "-t", "0.1", "-M", "1048576"])
        .arg(&input)
        .arg(&encrypted)
        .assert()
        .success();

    bin()
        .arg("info")
        .arg(&encrypted)
        .assert()
        .success()
        .stdout(predicate::str::contains("r = 8"))
        .stdout(predicate::str::contains("Memory required"));

    let output = bin()
        .args(["info", "--json"])
        .arg(&encrypted)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["r"], 8);
    assert!(report["memory_bytes"].as_u64().unwrap() <= 1_048_576);
    assert_eq!(report["salt"].as_str().unwrap().len(), 64);
    assert!(report["estimated_seconds"].as_f64().is_some());
}

#[test]
fn hash_matches_rfc7914_vector() {
    bin()
        .env("SCRYPTBOX_PASSWORD", "password")
        .args(["hash", "NaCl", "-N", "1024", "-r", "8", "-p", "16"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "fdbabe1c9d3472007856e7190d01e9fe7c6ad7cbc8237830e77376634b373162\
             2eaf30d92e22a3886ff109279d9830dac727afb94a83ee6d8360cbdfa2cc0640",
        ));
}

#[test]
fn hash_accepts_empty_password_from_env() {
    bin()
        .env("SCRYPTBOX_PASSWORD", "")
        .args(["hash", "", "-N", "16", "-r", "1", "-p", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "77d6576238657b203b19ca42c18a0497f16b4844e3074ae8dfdffa3fede21442\
             fcd0069ded0948f8326a753a0fc81f17e8d3e0fb2e0d3628cf35e20c38d18906",
        ));
}

#[test]
fn hash_accepts_empty_piped_password() {
    bin()
        .env_remove("SCRYPTBOX_PASSWORD")
        .args(["hash", "", "-N", "16", "-r", "1", "-p", "1"])
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("77d6576238657b20"));
}

#[test]
fn dec_rejects_empty_piped_password() {
    let dir = tempdir().unwrap();
    let blob = dir.path().join("any.scrypt");
    fs::write(&blob, vec![0u8; 256]).unwrap();

    bin()
        .env_remove("SCRYPTBOX_PASSWORD")
        .arg("dec")
        .arg(&blob)
        .write_stdin("\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No password provided"));
}

#[test]
fn hash_accepts_hex_salt() {
    // "NaCl" in hex.
    bin()
        .env("SCRYPTBOX_PASSWORD", "password")
        .args(["hash", "4e61436c", "--hex-salt", "-N", "1024", "-r", "8", "-p", "16"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("fdbabe1c9d347200"));
}

#[test]
fn hash_rejects_non_power_of_two() {
    bin()
        .env("SCRYPTBOX_PASSWORD", "password")
        .args(["hash", "salt", "-N", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("hash parameters are wrong"));
}
