use anyhow::{Result, bail};
use std::io::{self, BufRead, IsTerminal};
use zeroize::Zeroizing;

pub const PASSWORD_ENV: &str = "SCRYPTBOX_PASSWORD";

/// Where a password may come from once the environment variable is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Ask once.
    Existing,
    /// Ask once and accept an empty password.
    AllowEmpty,
    /// Ask twice and require both entries to match.
    New,
}

/// Reads a password from the environment, a piped stdin line, or the TTY.
///
/// `stdin_free` is false when stdin carries the payload, in which case only
/// the environment and the terminal are consulted.
pub fn read_password(prompt: Prompt, stdin_free: bool) -> Result<Zeroizing<String>> {
    //  SCRYPTBOX_PASSWORD="supersecret" scryptbox dec secret.scrypt
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() || prompt == Prompt::AllowEmpty {
            return Ok(Zeroizing::new(pw));
        }
    }

    //  printf "%s\n" "$PW" | scryptbox enc notes.txt notes.scrypt
    if stdin_free && !io::stdin().is_terminal() {
        return read_piped(prompt);
    }

    match prompt {
        Prompt::Existing | Prompt::AllowEmpty => {
            let pw = Zeroizing::new(rpassword::prompt_password("Password: ")?);
            require_password(prompt, pw)
        }
        Prompt::New => {
            let pw1 = Zeroizing::new(rpassword::prompt_password("New password: ")?);
            let pw2 = Zeroizing::new(rpassword::prompt_password("Confirm password: ")?);
            confirm(pw1, &pw2)
        }
    }
}

fn read_piped(prompt: Prompt) -> Result<Zeroizing<String>> {
    let stdin = io::stdin();
    let mut handle = stdin.lock();

    let mut pw1 = Zeroizing::new(String::new());
    handle.read_line(&mut pw1)?;
    trim_newline(&mut pw1);

    if prompt != Prompt::New {
        return require_password(prompt, pw1);
    }

    let mut pw2 = Zeroizing::new(String::new());
    handle.read_line(&mut pw2)?;
    trim_newline(&mut pw2);
    confirm(pw1, &pw2)
}

fn require_password(prompt: Prompt, pw: Zeroizing<String>) -> Result<Zeroizing<String>> {
    if pw.is_empty() && prompt != Prompt::AllowEmpty {
        bail!("No password provided");
    }
    Ok(pw)
}

fn confirm(pw1: Zeroizing<String>, pw2: &str) -> Result<Zeroizing<String>> {
    if pw1.is_empty() {
        bail!("password cannot be empty");
    }

    if pw1.as_str() != pw2 {
        bail!("passwords do not match");
    }

    Ok(pw1)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
