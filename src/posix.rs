//! # POSIX-Style Compatibility Module
//!
//! The driver proper reports failures through typed errors.  These wrappers
//! preserve the classic surface at the outermost boundary: operations return
//! a success code or `-1`, `open` returns a handle or `-1`, and `read`/`write`
//! return a byte count or `-1`.  The underlying error is logged before it is
//! collapsed.

use log::error;
use crate::driver::Driver;

pub fn mount_disk(drv: &mut Driver) -> i32 {
    match drv.mount() {
        Ok(()) => 0,
        Err(e) => {
            error!("mount failed: {}",e);
            -1
        }
    }
}

pub fn unmount_disk(drv: &mut Driver) -> i32 {
    match drv.unmount() {
        Ok(()) => 0,
        Err(e) => {
            error!("unmount failed: {}",e);
            -1
        }
    }
}

pub fn open(drv: &mut Driver,path: &str) -> i16 {
    match drv.open(path) {
        Ok(fd) => fd as i16,
        Err(e) => {
            error!("open failed: {}",e);
            -1
        }
    }
}

pub fn close(drv: &mut Driver,fd: i16) -> i32 {
    if fd < 0 {
        return -1;
    }
    match drv.close(fd as u16) {
        Ok(()) => 0,
        Err(e) => {
            error!("close failed: {}",e);
            -1
        }
    }
}

pub fn seek(drv: &mut Driver,fd: i16,loc: u32) -> i32 {
    if fd < 0 {
        return -1;
    }
    match drv.seek(fd as u16,loc as usize) {
        Ok(()) => 0,
        Err(e) => {
            error!("seek failed: {}",e);
            -1
        }
    }
}

pub fn read(drv: &mut Driver,fd: i16,buf: &mut [u8],count: usize) -> i32 {
    if fd < 0 {
        return -1;
    }
    match drv.read(fd as u16,buf,count) {
        Ok(n) => n as i32,
        Err(e) => {
            error!("read failed: {}",e);
            -1
        }
    }
}

pub fn write(drv: &mut Driver,fd: i16,buf: &[u8],count: usize) -> i32 {
    if fd < 0 {
        return -1;
    }
    match drv.write(fd as u16,buf,count) {
        Ok(n) => n as i32,
        Err(e) => {
            error!("write failed: {}",e);
            -1
        }
    }
}
