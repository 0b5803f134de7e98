// test of the driver against the in-memory controller
use remdisk::cache::SectorCache;
use remdisk::controller::Controller;
use remdisk::driver::Driver;
use remdisk::net::Session;
use remdisk::posix;
use remdisk::proto::{SECTOR_SIZE,TRACK_SIZE};
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

fn test_driver(port: u16,lines: usize) -> Driver {
    let session = Session::new(Some("127.0.0.1".to_string()),Some(port));
    let cache = SectorCache::new(lines).expect("failed to create cache");
    Driver::new(session,cache)
}

#[test]
fn basic_round_trip() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    drv.mount()?;
    let fd = drv.open("a")?;
    assert_eq!(drv.write(fd,b"HELLO",5)?,5);
    drv.seek(fd,0)?;
    let mut out = [0u8;5];
    assert_eq!(drv.read(fd,&mut out,5)?,5);
    assert_eq!(&out,b"HELLO");
    assert_eq!(drv.stat(fd)?,(5,5));
    drv.unmount()?;
    Ok(())
}

#[test]
fn cross_sector_write() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    drv.mount()?;
    let fd = drv.open("b")?;
    let payload = vec![0xab;1500];
    assert_eq!(drv.write(fd,&payload,1500)?,1500);
    assert_eq!(drv.stat(fd)?.0,1500);
    assert_eq!(drv.allocated_cells(),2);
    assert_eq!(controller.counts().writes,2);
    drv.seek(fd,0)?;
    let mut out = vec![0u8;1500];
    assert_eq!(drv.read(fd,&mut out,1500)?,1500);
    assert_eq!(out,payload);
    Ok(())
}

#[test]
fn cache_hit_skips_wire() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    drv.mount()?;
    let fd = drv.open("a")?;
    drv.write(fd,b"HELLO",5)?;
    drv.seek(fd,0)?;
    let mut out = [0u8;5];
    drv.read(fd,&mut out,5)?;
    let hits_before = drv.cache_stats().hits;
    drv.seek(fd,0)?;
    drv.read(fd,&mut out,5)?;
    assert_eq!(drv.cache_stats().hits,hits_before+1);
    // the write warmed the cache, so nothing was ever read over the wire
    assert_eq!(controller.counts().reads,0);
    Ok(())
}

#[test]
fn wire_read_on_cache_miss() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    // one cache line, so the second file's sector evicts the first
    let mut drv = test_driver(controller.port(),1);
    drv.mount()?;
    let fa = drv.open("a")?;
    drv.write(fa,b"HELLO",5)?;
    let fb = drv.open("b")?;
    drv.write(fb,b"WORLD",5)?;
    // partial overwrite of an evicted sector must pre-read it from the wire
    drv.seek(fa,0)?;
    drv.write(fa,b"XY",2)?;
    assert_eq!(controller.counts().reads,1);
    drv.seek(fa,0)?;
    let mut out = [0u8;5];
    assert_eq!(drv.read(fa,&mut out,5)?,5);
    assert_eq!(&out,b"XYLLO");
    Ok(())
}

#[test]
fn partial_overwrite_in_place() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    drv.mount()?;
    let fd = drv.open("a")?;
    drv.write(fd,b"HELLOWORLD",10)?;
    drv.seek(fd,2)?;
    assert_eq!(drv.write(fd,b"XX",2)?,2);
    assert_eq!(drv.stat(fd)?,(10,4));
    assert_eq!(drv.allocated_cells(),1);
    drv.seek(fd,0)?;
    let mut out = [0u8;10];
    drv.read(fd,&mut out,10)?;
    assert_eq!(&out,b"HEXXOWORLD");
    Ok(())
}

#[test]
fn write_through_reaches_controller() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    drv.mount()?;
    let fd = drv.open("a")?;
    drv.write(fd,b"HELLO",5)?;
    let sec = controller.sector(0,0).expect("sector never arrived");
    assert_eq!(&sec[0..5],b"HELLO");
    // a fresh sector is zero filled past the written bytes
    assert_eq!(sec[5..SECTOR_SIZE],[0u8;SECTOR_SIZE-5]);
    // sector contents survive the unmount even though metadata does not
    drv.unmount()?;
    assert!(controller.sector(0,0).is_some());
    Ok(())
}

#[test]
fn unmount_closes_files() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    drv.mount()?;
    let fd = drv.open("c")?;
    drv.write(fd,b"xyz",3)?;
    drv.unmount()?;
    let mut out = [0u8;3];
    assert!(drv.read(fd,&mut out,3).is_err());
    // a new mount starts from a clean slate
    drv.mount()?;
    assert!(drv.read(fd,&mut out,3).is_err());
    assert_eq!(drv.allocated_cells(),0);
    Ok(())
}

#[test]
fn seek_beyond_eof() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    drv.mount()?;
    let fd = drv.open("d")?;
    drv.write(fd,b"xyz",3)?;
    assert!(drv.seek(fd,4).is_err());
    assert_eq!(drv.stat(fd)?.1,3);
    drv.seek(fd,3)?;
    assert_eq!(drv.stat(fd)?.1,3);
    Ok(())
}

#[test]
fn read_stops_at_eof() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    drv.mount()?;
    let fd = drv.open("d")?;
    drv.write(fd,b"xyz",3)?;
    // position is at the end, nothing to read
    let mut out = [0u8;8];
    assert_eq!(drv.read(fd,&mut out,8)?,0);
    drv.seek(fd,1)?;
    assert_eq!(drv.read(fd,&mut out,8)?,2);
    assert_eq!(&out[0..2],b"yz");
    Ok(())
}

#[test]
fn reopen_rewinds_and_keeps_length() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    drv.mount()?;
    let fd = drv.open("a")?;
    drv.write(fd,b"HELLO",5)?;
    drv.close(fd)?;
    let fd2 = drv.open("a")?;
    assert_eq!(fd2,fd);
    assert_eq!(drv.stat(fd2)?,(5,0));
    Ok(())
}

#[test]
fn close_semantics() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    drv.mount()?;
    let fd = drv.open("a")?;
    drv.close(fd)?;
    // closing twice is an error, as is touching the closed file
    assert!(drv.close(fd).is_err());
    let mut out = [0u8;1];
    assert!(drv.read(fd,&mut out,1).is_err());
    assert!(drv.write(fd,b"x",1).is_err());
    assert!(drv.seek(fd,0).is_err());
    Ok(())
}

#[test]
fn allocation_matches_lengths() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    drv.mount()?;
    let fa = drv.open("a")?;
    let fb = drv.open("b")?;
    let fc = drv.open("c")?;
    drv.write(fa,b"HELLO",5)?;
    drv.write(fb,&vec![0xab;1500],1500)?;
    drv.write(fc,&vec![0xcd;SECTOR_SIZE],SECTOR_SIZE)?;
    // extend a to exactly two sectors
    drv.write(fa,&vec![0x11;2043],2043)?;
    // overwriting does not allocate
    drv.seek(fb,0)?;
    drv.write(fb,&vec![0x22;100],100)?;
    let mut expected = 0;
    for fd in [fa,fb,fc] {
        let (length,_pos) = drv.stat(fd)?;
        expected += (length + SECTOR_SIZE - 1) / SECTOR_SIZE;
    }
    assert_eq!(expected,5);
    assert_eq!(drv.allocated_cells(),expected);
    Ok(())
}

#[test]
fn track_seeks_are_elided() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    drv.mount()?;
    let fd = drv.open("a")?;
    drv.write(fd,b"first",5)?;
    assert_eq!(controller.counts().seeks,1);
    // same track, no further seeks
    drv.write(fd,b"second",6)?;
    drv.seek(fd,0)?;
    let mut out = [0u8;11];
    drv.read(fd,&mut out,11)?;
    assert_eq!(controller.counts().seeks,1);
    assert_eq!(&out,b"firstsecond");
    Ok(())
}

#[test]
fn multi_track_file() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    drv.mount()?;
    let fd = drv.open("big")?;
    // spill over the end of track 0
    let total = TRACK_SIZE*SECTOR_SIZE + 1500;
    let mut payload = vec![0u8;total];
    for i in 0..total {
        payload[i] = (i % 251) as u8;
    }
    assert_eq!(drv.write(fd,&payload,total)?,total);
    // one seek onto track 0, one onto track 1
    assert_eq!(controller.counts().seeks,2);
    drv.seek(fd,0)?;
    let mut out = vec![0u8;total];
    assert_eq!(drv.read(fd,&mut out,total)?,total);
    assert_eq!(out,payload);
    // the read crossed back to track 0 and over to track 1 again
    assert_eq!(controller.counts().seeks,4);
    assert_eq!(drv.allocated_cells(),TRACK_SIZE+2);
    Ok(())
}

#[test]
fn mount_preconditions() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    assert!(drv.unmount().is_err());
    drv.mount()?;
    assert!(drv.mount().is_err());
    drv.unmount()?;
    Ok(())
}

#[test]
fn posix_shim() -> STDRESULT {
    let controller = Controller::spawn(0)?;
    let mut drv = test_driver(controller.port(),8);
    assert_eq!(posix::mount_disk(&mut drv),0);
    let fd = posix::open(&mut drv,"a");
    assert!(fd >= 0);
    assert_eq!(posix::write(&mut drv,fd,b"HELLO",5),5);
    assert_eq!(posix::seek(&mut drv,fd,0),0);
    let mut out = [0u8;5];
    assert_eq!(posix::read(&mut drv,fd,&mut out,5),5);
    assert_eq!(&out,b"HELLO");
    assert_eq!(posix::seek(&mut drv,fd,6),-1);
    assert_eq!(posix::read(&mut drv,fd,&mut out,5),0);
    assert_eq!(posix::close(&mut drv,fd),0);
    assert_eq!(posix::close(&mut drv,fd),-1);
    assert_eq!(posix::read(&mut drv,-1,&mut out,5),-1);
    assert_eq!(posix::unmount_disk(&mut drv),0);
    assert_eq!(posix::read(&mut drv,fd,&mut out,5),-1);
    Ok(())
}
