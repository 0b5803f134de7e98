//! # Driver Module
//!
//! The file layer.  A `Driver` owns a `Session` and a `SectorCache` and holds
//! the file table and the allocation map.  Files are linear byte streams; the
//! allocation map records which file owns each (track,sector) cell, and the
//! byte stream of a file is the concatenation of its sectors in scan order
//! `(0,0),(0,1),..,(0,TRACK_SIZE-1),(1,0),..`.  Sectors are handed out from
//! the front of that order, so the first empty cell is always the next
//! allocation and a scan can stop at the first empty cell it meets.
//!
//! The controller resolves sector transfers against its current track, which
//! only a `TRACK_SEEK` moves.  The session's current-track shadow lets the
//! driver skip seeks that would not move the head; the shadow starts out
//! unknown at every mount.
//!
//! All metadata is in-memory only.  Unmounting and remounting clears the file
//! table and allocation map even though sector contents remain on the
//! controller.

use log::{debug,error,info};
use crate::cache::{SectorCache,CacheStats};
use crate::net::Session;
use crate::proto;
use crate::proto::{SectorBuf,SECTOR_SIZE,TRACK_SIZE,MAX_TRACKS};
use crate::{DYNERR,STDRESULT};

/// Maximum number of files ever
pub const MAX_FILES: usize = 1024;
/// Maximum length of a path string in bytes
pub const MAX_PATH: usize = 128;

/// Enumerates driver errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("disk is not mounted")]
    NotMounted,
    #[error("disk is already mounted")]
    AlreadyMounted,
    #[error("file handle is out of range")]
    BadHandle,
    #[error("file was never created")]
    NotCreated,
    #[error("file is not open")]
    NotOpen,
    #[error("file table is full")]
    TableFull,
    #[error("no free sector remains on the disk")]
    DiskFull,
    #[error("path exceeds the maximum length")]
    PathRange,
    #[error("seek lies beyond the end of the file")]
    SeekRange,
    #[error("allocation map does not cover the file")]
    MapMismatch,
    #[error("controller refused the request")]
    Refused
}

struct FileRecord {
    created: bool,
    open: bool,
    name: String,
    length: usize,
    position: usize
}

impl FileRecord {
    fn blank() -> Self {
        Self {
            created: false,
            open: false,
            name: String::new(),
            length: 0,
            position: 0
        }
    }
}

/// The primary interface for disk operations.
/// The driver takes ownership of a session and a cache at construction;
/// every other piece of state is created blank and reset at each mount.
pub struct Driver {
    session: Session,
    cache: SectorCache,
    mounted: bool,
    files: Vec<FileRecord>,
    map: Vec<Vec<Option<u16>>>
}

impl Driver {
    pub fn new(session: Session,cache: SectorCache) -> Self {
        let mut files: Vec<FileRecord> = Vec::new();
        for _i in 0..MAX_FILES {
            files.push(FileRecord::blank());
        }
        Self {
            session,
            cache,
            mounted: false,
            files,
            map: vec![vec![None;TRACK_SIZE];MAX_TRACKS]
        }
    }
    /// issue a syscall and check both the transport result and the return status bit
    fn call(&mut self,cmd: u64,payload: Option<&mut SectorBuf>) -> Result<u64,DYNERR> {
        let reply = self.session.syscall(cmd,payload)?;
        if proto::return_of(reply) != 0 {
            error!("controller refused op {}",proto::opcode_of(cmd));
            return Err(Box::new(Error::Refused));
        }
        Ok(reply)
    }
    /// switch the controller to `track` unless the shadow already matches
    fn switch_track(&mut self,track: u32) -> STDRESULT {
        if self.session.current_track()==Some(track) {
            return Ok(());
        }
        debug!("seeking to track {}",track);
        self.call(proto::pack(proto::OP_TRACK_SEEK,0,track,0),None)?;
        self.session.set_current_track(Some(track));
        Ok(())
    }
    /// locate the `part`-th sector owned by `fd` in scan order
    fn locate_part(&self,fd: u16,part: usize) -> Option<(u32,u16)> {
        let mut count = 0;
        for t in 0..MAX_TRACKS {
            for s in 0..TRACK_SIZE {
                match self.map[t][s] {
                    Some(owner) => {
                        if owner==fd {
                            if count==part {
                                return Some((t as u32,s as u16));
                            }
                            count += 1;
                        }
                    },
                    // allocation is contiguous from the front, nothing lies past the first empty cell
                    None => return None
                }
            }
        }
        None
    }
    /// first empty cell in scan order, which is always the next allocation
    fn find_free(&self) -> Option<(u32,u16)> {
        for t in 0..MAX_TRACKS {
            for s in 0..TRACK_SIZE {
                if self.map[t][s].is_none() {
                    return Some((t as u32,s as u16));
                }
            }
        }
        None
    }
    fn check_handle(&self,fd: u16) -> STDRESULT {
        if fd as usize >= MAX_FILES {
            return Err(Box::new(Error::BadHandle));
        }
        if !self.files[fd as usize].created {
            return Err(Box::new(Error::NotCreated));
        }
        Ok(())
    }
    /// fetch a sector into `scratch`, consulting the cache before the wire,
    /// and warm the cache after any wire read
    fn fetch_sector(&mut self,track: u32,sector: u16,scratch: &mut SectorBuf) -> STDRESULT {
        let hit = match self.cache.get(track,sector) {
            Some(data) => {
                scratch.copy_from_slice(data);
                true
            },
            None => false
        };
        if !hit {
            self.call(proto::pack(proto::OP_READ_SECTOR,sector,0,0),Some(&mut *scratch))?;
            self.cache.put(track,sector,scratch);
        }
        Ok(())
    }

    /// Mount the disk, establishing the controller connection and resetting
    /// the file table and allocation map.
    pub fn mount(&mut self) -> STDRESULT {
        if self.mounted {
            return Err(Box::new(Error::AlreadyMounted));
        }
        self.call(proto::pack(proto::OP_MOUNT,0,0,0),None)?;
        self.mounted = true;
        self.session.set_current_track(None);
        for rec in self.files.iter_mut() {
            *rec = FileRecord::blank();
        }
        for t in 0..MAX_TRACKS {
            for s in 0..TRACK_SIZE {
                self.map[t][s] = None;
            }
        }
        info!("disk mounted");
        Ok(())
    }
    /// Unmount the disk.  The connection closes and every created file
    /// transitions to closed.
    pub fn unmount(&mut self) -> STDRESULT {
        if !self.mounted {
            return Err(Box::new(Error::NotMounted));
        }
        self.call(proto::pack(proto::OP_UNMOUNT,0,0,0),None)?;
        self.mounted = false;
        for rec in self.files.iter_mut() {
            if rec.created {
                rec.open = false;
            }
        }
        info!("disk unmounted");
        Ok(())
    }
    /// Open a file by path, creating a record on first sight of the name.
    /// Reopening rewinds the position and keeps the length.  Returns the handle.
    pub fn open(&mut self,path: &str) -> Result<u16,DYNERR> {
        if path.len() > MAX_PATH {
            return Err(Box::new(Error::PathRange));
        }
        for i in 0..MAX_FILES {
            if self.files[i].created && self.files[i].name==path {
                self.files[i].open = true;
                self.files[i].position = 0;
                return Ok(i as u16);
            }
        }
        for i in 0..MAX_FILES {
            if !self.files[i].created {
                self.files[i].created = true;
                self.files[i].open = true;
                self.files[i].name = path.to_string();
                self.files[i].length = 0;
                self.files[i].position = 0;
                debug!("created `{}` with handle {}",path,i);
                return Ok(i as u16);
            }
        }
        Err(Box::new(Error::TableFull))
    }
    /// Close an open file.  Closing a file that is not open is an error.
    pub fn close(&mut self,fd: u16) -> STDRESULT {
        self.check_handle(fd)?;
        if !self.files[fd as usize].open {
            return Err(Box::new(Error::NotOpen));
        }
        self.files[fd as usize].open = false;
        Ok(())
    }
    /// Move the position of an open file to `loc`, which may be anywhere in
    /// `[0,length]`.
    pub fn seek(&mut self,fd: u16,loc: usize) -> STDRESULT {
        self.check_handle(fd)?;
        if !self.files[fd as usize].open {
            return Err(Box::new(Error::NotOpen));
        }
        if loc > self.files[fd as usize].length {
            return Err(Box::new(Error::SeekRange));
        }
        self.files[fd as usize].position = loc;
        Ok(())
    }
    /// Read up to `count` bytes at the current position into `buf`, advancing
    /// the position.  No more than `buf.len()` bytes are moved, and the count
    /// comes up short only at end of file.  Never extends the file.
    pub fn read(&mut self,fd: u16,buf: &mut [u8],count: usize) -> Result<usize,DYNERR> {
        if !self.mounted {
            return Err(Box::new(Error::NotMounted));
        }
        self.check_handle(fd)?;
        if !self.files[fd as usize].open {
            return Err(Box::new(Error::NotOpen));
        }
        let mut remaining = usize::min(count,buf.len());
        let mut bytes_read = 0;
        loop {
            let pos = self.files[fd as usize].position;
            let length = self.files[fd as usize].length;
            if remaining==0 || pos==length {
                break;
            }
            let intra = pos % SECTOR_SIZE;
            let (track,sector) = match self.locate_part(fd,pos / SECTOR_SIZE) {
                Some(ts) => ts,
                None => return Err(Box::new(Error::MapMismatch))
            };
            self.switch_track(track)?;
            let mut scratch: SectorBuf = [0;SECTOR_SIZE];
            self.fetch_sector(track,sector,&mut scratch)?;
            let mut chunk = SECTOR_SIZE - intra;
            if chunk > remaining {
                chunk = remaining;
            }
            if chunk > length - pos {
                chunk = length - pos;
            }
            buf[bytes_read..bytes_read+chunk].copy_from_slice(&scratch[intra..intra+chunk]);
            self.files[fd as usize].position += chunk;
            bytes_read += chunk;
            remaining -= chunk;
        }
        Ok(bytes_read)
    }
    /// Write `count` bytes from `buf` at the current position, advancing the
    /// position and extending the length when the position passes it.  New
    /// sectors come from the front of the free list; a partial overwrite of an
    /// owned sector fetches the current contents first, cache before wire.
    pub fn write(&mut self,fd: u16,buf: &[u8],count: usize) -> Result<usize,DYNERR> {
        if !self.mounted {
            return Err(Box::new(Error::NotMounted));
        }
        self.check_handle(fd)?;
        if !self.files[fd as usize].open {
            return Err(Box::new(Error::NotOpen));
        }
        let mut remaining = usize::min(count,buf.len());
        let mut bytes_written = 0;
        while remaining > 0 {
            let pos = self.files[fd as usize].position;
            let intra = pos % SECTOR_SIZE;
            let (track,sector,owned) = match self.locate_part(fd,pos / SECTOR_SIZE) {
                Some((t,s)) => (t,s,true),
                None => match self.find_free() {
                    Some((t,s)) => {
                        debug!("allocating sector ({},{}) to handle {}",t,s,fd);
                        (t,s,false)
                    },
                    None => return Err(Box::new(Error::DiskFull))
                }
            };
            self.switch_track(track)?;
            // a fresh cell starts zero filled so unwritten bytes read back deterministically
            let mut scratch: SectorBuf = [0;SECTOR_SIZE];
            if owned {
                self.fetch_sector(track,sector,&mut scratch)?;
            }
            let mut chunk = SECTOR_SIZE - intra;
            if chunk > remaining {
                chunk = remaining;
            }
            scratch[intra..intra+chunk].copy_from_slice(&buf[bytes_written..bytes_written+chunk]);
            self.cache.put(track,sector,&scratch);
            self.call(proto::pack(proto::OP_WRITE_SECTOR,sector,0,0),Some(&mut scratch))?;
            self.map[track as usize][sector as usize] = Some(fd);
            let rec = &mut self.files[fd as usize];
            rec.position += chunk;
            if rec.position > rec.length {
                rec.length = rec.position;
            }
            bytes_written += chunk;
            remaining -= chunk;
        }
        Ok(bytes_written)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
    /// (length,position) of a created file, open or not
    pub fn stat(&self,fd: u16) -> Result<(usize,usize),DYNERR> {
        self.check_handle(fd)?;
        Ok((self.files[fd as usize].length,self.files[fd as usize].position))
    }
    /// number of allocation map cells assigned to any file
    pub fn allocated_cells(&self) -> usize {
        let mut count = 0;
        for t in 0..MAX_TRACKS {
            for s in 0..TRACK_SIZE {
                if self.map[t][s].is_some() {
                    count += 1;
                }
            }
        }
        count
    }
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
    pub fn log_cache_metrics(&self) {
        self.cache.log_metrics();
    }
}
