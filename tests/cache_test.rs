// test of the sector cache in isolation
use remdisk::cache::SectorCache;
use remdisk::proto::{SectorBuf,SECTOR_SIZE};

fn sector_of(byte: u8) -> SectorBuf {
    [byte;SECTOR_SIZE]
}

#[test]
fn rejects_zero_capacity() {
    assert!(SectorCache::new(0).is_err());
    assert_eq!(SectorCache::new(4).expect("failed to create cache").capacity(),4);
}

#[test]
fn fills_before_evicting() {
    let mut cache = SectorCache::new(4).expect("failed to create cache");
    for s in 0..4 {
        cache.put(0,s,&sector_of(s as u8));
    }
    for s in 0..4 {
        assert_eq!(cache.get(0,s).expect("missing line")[0],s as u8);
    }
}

#[test]
fn evicts_least_recently_used() {
    // fill a cache of 4 with 6 distinct keys touched once each,
    // exactly the first 2 must be gone
    let mut cache = SectorCache::new(4).expect("failed to create cache");
    for s in 0..6 {
        cache.put(0,s,&sector_of(s as u8));
    }
    assert!(cache.get(0,0).is_none());
    assert!(cache.get(0,1).is_none());
    for s in 2..6 {
        assert!(cache.get(0,s).is_some());
    }
}

#[test]
fn hit_refreshes_recency() {
    let mut cache = SectorCache::new(2).expect("failed to create cache");
    cache.put(0,0,&sector_of(0xaa));
    cache.put(0,1,&sector_of(0xbb));
    // touching (0,0) makes (0,1) the eviction victim
    assert!(cache.get(0,0).is_some());
    cache.put(1,0,&sector_of(0xcc));
    assert!(cache.get(0,0).is_some());
    assert!(cache.get(0,1).is_none());
    assert!(cache.get(1,0).is_some());
}

#[test]
fn overwrite_updates_in_place() {
    let mut cache = SectorCache::new(2).expect("failed to create cache");
    cache.put(0,0,&sector_of(0xaa));
    cache.put(0,1,&sector_of(0xbb));
    cache.put(0,0,&sector_of(0xcc));
    // the key match was overwritten, nothing was evicted
    assert_eq!(cache.get(0,0).expect("missing line")[0],0xcc);
    assert_eq!(cache.get(0,1).expect("missing line")[0],0xbb);
}

#[test]
fn tracks_distinguish_keys() {
    let mut cache = SectorCache::new(4).expect("failed to create cache");
    cache.put(0,7,&sector_of(0xaa));
    cache.put(1,7,&sector_of(0xbb));
    assert_eq!(cache.get(0,7).expect("missing line")[0],0xaa);
    assert_eq!(cache.get(1,7).expect("missing line")[0],0xbb);
}

#[test]
fn counters_accumulate() {
    let mut cache = SectorCache::new(2).expect("failed to create cache");
    assert_eq!(cache.stats().hit_ratio(),0.0);
    cache.put(0,0,&sector_of(0xaa));
    cache.get(0,0);
    cache.get(0,0);
    cache.get(0,1);
    cache.get(5,5);
    let stats = cache.stats();
    assert_eq!(stats.inserts,1);
    assert_eq!(stats.gets,4);
    assert_eq!(stats.hits,2);
    assert_eq!(stats.misses,2);
    assert_eq!(stats.hit_ratio(),50.0);
}
