//! # Sector Cache Module
//!
//! A fixed-capacity cache of sector payloads keyed by (track,sector).
//! Lookup and insertion are linear scans, which is the right trade for the
//! small line counts this device wants.  Eviction picks the line with the
//! smallest use stamp; every hit and insertion bumps the stamp off a
//! monotone counter, so the victim is always the least recently used line.
//!
//! The cache is write-through at the file layer: a sector is put here before
//! the matching wire write goes out, so the cache never holds the only copy
//! of dirty data and an evicted line can simply be dropped.

use log::info;
use crate::proto::{SectorBuf,SECTOR_SIZE};
use crate::DYNERR;

/// cache lines to allocate when the caller expresses no preference
pub const DEFAULT_LINES: usize = 8;

#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("cache capacity must be positive")]
    ZeroCapacity
}

struct CacheLine {
    key: Option<(u32,u16)>,
    stamp: u64,
    data: SectorBuf
}

/// Running counters, monotone over the life of the cache value.
#[derive(Clone,Copy,Default)]
pub struct CacheStats {
    pub inserts: u64,
    pub gets: u64,
    pub hits: u64,
    pub misses: u64
}

impl CacheStats {
    /// hits over gets as a percentage, 0 when nothing was looked up yet
    pub fn hit_ratio(&self) -> f64 {
        match self.gets {
            0 => 0.0,
            n => 100.0 * self.hits as f64 / n as f64
        }
    }
}

/// Fixed-capacity sector cache with least-recently-used eviction.
/// Capacity is set at construction and immutable afterwards; dropping the
/// value releases every line.
pub struct SectorCache {
    lines: Vec<CacheLine>,
    use_count: u64,
    stats: CacheStats
}

impl SectorCache {
    pub fn new(lines: usize) -> Result<Self,DYNERR> {
        if lines==0 {
            return Err(Box::new(Error::ZeroCapacity));
        }
        let mut ans: Vec<CacheLine> = Vec::new();
        for _i in 0..lines {
            ans.push(CacheLine {
                key: None,
                stamp: 0,
                data: [0;SECTOR_SIZE]
            });
        }
        Ok(Self {
            lines: ans,
            use_count: 0,
            stats: CacheStats::default()
        })
    }
    pub fn capacity(&self) -> usize {
        self.lines.len()
    }
    /// Insert or update the sector under `(track,sector)`.  A key match is
    /// overwritten in place, otherwise the line with the smallest stamp is
    /// evicted, ties going to the lowest index.  Unused lines carry stamp 0
    /// and so fill up first.
    pub fn put(&mut self,track: u32,sector: u16,data: &SectorBuf) {
        let key = Some((track,sector));
        let mut slot = 0;
        let mut min_stamp = self.lines[0].stamp;
        for i in 0..self.lines.len() {
            if self.lines[i].key==key {
                slot = i;
                break;
            }
            if self.lines[i].stamp < min_stamp {
                min_stamp = self.lines[i].stamp;
                slot = i;
            }
        }
        self.stats.inserts += 1;
        self.use_count += 1;
        self.lines[slot].key = key;
        self.lines[slot].stamp = self.use_count;
        self.lines[slot].data.copy_from_slice(data);
    }
    /// Look up `(track,sector)`, bumping its use stamp on a hit.
    pub fn get(&mut self,track: u32,sector: u16) -> Option<&SectorBuf> {
        self.stats.gets += 1;
        let key = Some((track,sector));
        for i in 0..self.lines.len() {
            if self.lines[i].key==key {
                self.stats.hits += 1;
                self.use_count += 1;
                self.lines[i].stamp = self.use_count;
                return Some(&self.lines[i].data);
            }
        }
        self.stats.misses += 1;
        return None;
    }
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
    /// Emit the running counters through the log facade.
    pub fn log_metrics(&self) {
        info!("** sector cache metrics **");
        info!("cache inserts    [{:9}]",self.stats.inserts);
        info!("cache gets       [{:9}]",self.stats.gets);
        info!("cache hits       [{:9}]",self.stats.hits);
        info!("cache misses     [{:9}]",self.stats.misses);
        info!("cache hit ratio  [{:8.2}%]",self.stats.hit_ratio());
    }
}
