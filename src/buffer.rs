use std::os::fd::OwnedFd;

use crate::error::CaptureError;

pub fn create_memfd(width: u32, height: u32) -> Result<OwnedFd, CaptureError> {
    // TODO: BSD support using shm_open
    let name = c"snaplingo-screencopy";
    let fd = rustix::fs::memfd_create(name, rustix::fs::MemfdFlags::CLOEXEC)
        .map_err(|e| CaptureError::Buffer(format!("memfd_create: {e}")))?;
    rustix::fs::ftruncate(&fd, u64::from(width) * u64::from(height) * 4)
        .map_err(|e| CaptureError::Buffer(format!("ftruncate: {e}")))?;
    Ok(fd)
}
