//! Filesystem statistics for the configured mount points.
//!
//! `statvfs` blocks, so callers run [`read_disks`] on the blocking pool.

use homestead_core::telemetry::DiskUsage;

/// Usage of every path in `paths`, in order. Paths whose statistics cannot
/// be read are reported with `health = unknown` rather than failing the batch.
pub fn read_disks(paths: &[String]) -> Vec<DiskUsage> {
    paths.iter().map(|p| read_disk_usage(p)).collect()
}

#[cfg(unix)]
pub fn read_disk_usage(path: &str) -> DiskUsage {
    use std::ffi::CString;
    use std::mem::MaybeUninit;

    let Ok(c_path) = CString::new(path) else {
        tracing::warn!(path, "Disk path contains a NUL byte");
        return DiskUsage::unavailable(path);
    };
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();

    // SAFETY: `c_path` is a valid NUL-terminated string and `stat` points to
    // writable memory sized for `statvfs`.
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if ret != 0 {
        tracing::warn!(path, error = %std::io::Error::last_os_error(), "statvfs failed");
        return DiskUsage::unavailable(path);
    }

    // SAFETY: statvfs returned 0, so the struct is initialized.
    let stat = unsafe { stat.assume_init() };
    #[allow(clippy::unnecessary_cast)]
    DiskUsage::from_blocks(
        path,
        stat.f_blocks as u64,
        stat.f_bavail as u64,
        stat.f_frsize as u64,
    )
}

#[cfg(not(unix))]
pub fn read_disk_usage(path: &str) -> DiskUsage {
    DiskUsage::unavailable(path)
}
