//! Host memory limit detection.
//!
//! The usable amount is the smaller of physical RAM and the process resource
//! limits on address space and data segment size.

use crate::error::{Result, ScryptboxError};

/// Returns the number of bytes a single derivation may reasonably touch.
pub fn memory_limit() -> Result<u64> {
    let physical = physical_memory()?;
    let limit = process_limits()?
        .into_iter()
        .flatten()
        .fold(physical, u64::min);
    Ok(limit)
}

fn probe_error(what: &str) -> ScryptboxError {
    ScryptboxError::ResourceProbeFailed(format!(
        "{what}: {}",
        std::io::Error::last_os_error()
    ))
}

#[cfg(target_os = "linux")]
fn physical_memory() -> Result<u64> {
    // SAFETY: sysinfo only writes into the zero-initialised struct we own.
    let (info, rc) = unsafe {
        let mut info: libc::sysinfo = std::mem::zeroed();
        let rc = libc::sysinfo(&mut info);
        (info, rc)
    };
    if rc != 0 {
        return Err(probe_error("sysinfo failed"));
    }
    Ok((info.totalram as u64).saturating_mul(u64::from(info.mem_unit)))
}

#[cfg(all(unix, not(target_os = "linux")))]
fn physical_memory() -> Result<u64> {
    // SAFETY: sysconf has no memory-safety preconditions.
    let (pages, page_size) =
        unsafe { (libc::sysconf(libc::_SC_PHYS_PAGES), libc::sysconf(libc::_SC_PAGESIZE)) };
    if pages <= 0 || page_size <= 0 {
        return Err(probe_error("sysconf(_SC_PHYS_PAGES) failed"));
    }
    Ok((pages as u64).saturating_mul(page_size as u64))
}

#[cfg(windows)]
fn physical_memory() -> Result<u64> {
    use windows_sys::Win32::System::SystemInformation::{GlobalMemoryStatusEx, MEMORYSTATUSEX};

    // SAFETY:
    // - the struct is zero-initialised and dwLength is set as the API requires
    // - Windows does not retain the pointer after return
    let (status, ok) = unsafe {
        let mut status: MEMORYSTATUSEX = std::mem::zeroed();
        status.dwLength = std::mem::size_of::<MEMORYSTATUSEX>() as u32;
        let ok = GlobalMemoryStatusEx(&mut status);
        (status, ok)
    };
    if ok == 0 {
        return Err(probe_error("GlobalMemoryStatusEx failed"));
    }
    Ok(status.ullTotalPhys)
}

#[cfg(not(any(unix, windows)))]
fn physical_memory() -> Result<u64> {
    Err(ScryptboxError::ResourceProbeFailed(
        "physical memory query not supported on this platform".to_string(),
    ))
}

#[cfg(unix)]
fn process_limits() -> Result<[Option<u64>; 2]> {
    fn soft_limit(rl: &libc::rlimit) -> Option<u64> {
        if rl.rlim_cur == libc::RLIM_INFINITY {
            None
        } else {
            Some(rl.rlim_cur as u64)
        }
    }

    let mut address_space = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    let mut data = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };

    // SAFETY: getrlimit only writes into the structs we own.
    if unsafe { libc::getrlimit(libc::RLIMIT_AS, &mut address_space) } != 0 {
        return Err(probe_error("getrlimit(RLIMIT_AS) failed"));
    }
    // SAFETY: as above.
    if unsafe { libc::getrlimit(libc::RLIMIT_DATA, &mut data) } != 0 {
        return Err(probe_error("getrlimit(RLIMIT_DATA) failed"));
    }

    Ok([soft_limit(&address_space), soft_limit(&data)])
}

#[cfg(not(unix))]
fn process_limits() -> Result<[Option<u64>; 2]> {
    Ok([None, None])
}
