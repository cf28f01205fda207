use std::sync::Arc;

use device::{BlockDevice, RamDisk};
use fs::BlockFs;
use fs::blockfs::{SUPERBLOCK_LEN, Superblock};
use vfs::{OpenFlags, Stat, VfsDriver, VfsError};

fn formatted() -> (Arc<RamDisk>, Arc<BlockFs>) {
    let disk = RamDisk::default_geometry();
    let fs = BlockFs::new(disk.clone());
    fs.mkfs().unwrap();
    fs.mount().unwrap();
    (disk, fs)
}

fn flags(mode: &str) -> OpenFlags {
    OpenFlags::from_mode(mode).unwrap()
}

#[test]
fn test_mount_blank_device_fails() {
    let fs = BlockFs::new(RamDisk::default_geometry());
    assert_eq!(fs.mount(), Err(VfsError::Corrupted));
    assert!(!fs.is_mounted());
}

#[test]
fn test_mkfs_writes_superblock() {
    let (disk, _fs) = formatted();
    let raw = disk.raw_data();
    let sb = Superblock::decode(&raw[..SUPERBLOCK_LEN]).unwrap();
    assert_eq!(sb.block_size, 4096);
    assert_eq!(sb.block_count, 16);
    assert_eq!(sb.image_len, 5);
    // 空根目录镜像
    assert_eq!(&raw[4096..4101], &[2, 0, 0, 0, 0]);
}

#[test]
fn test_mkfs_needs_two_blocks() {
    let fs = BlockFs::new(RamDisk::new(512, 1));
    assert_eq!(fs.mkfs(), Err(VfsError::NoSpace));
}

#[test]
fn test_unmounted_operations() {
    let fs = BlockFs::new(RamDisk::default_geometry());
    assert_eq!(fs.stat("/"), Err(VfsError::NoDevice));
    assert_eq!(fs.open("/a", flags("w"), 0o666), Err(VfsError::NoDevice));
    assert_eq!(fs.unmount(), Err(VfsError::NoDevice));

    let (_disk, fs) = formatted();
    fs.unmount().unwrap();
    assert_eq!(fs.readdir("/"), Err(VfsError::NoDevice));
}

#[test]
fn test_file_roundtrip() {
    let (_disk, fs) = formatted();
    let id = fs.open("/test.txt", flags("w"), 0o666).unwrap();
    assert_eq!(fs.write(id, b"Hello, world!", None).unwrap(), 13);
    fs.close(id).unwrap();

    assert_eq!(fs.stat("/test.txt"), Ok(Stat::file(13)));

    let id = fs.open("/test.txt", flags("r"), 0o666).unwrap();
    let mut buf = [0u8; 32];
    assert_eq!(fs.read(id, &mut buf, None).unwrap(), 13);
    assert_eq!(&buf[..13], b"Hello, world!");
    assert_eq!(fs.read(id, &mut buf, None).unwrap(), 0);
    assert_eq!(fs.read(id, &mut buf[..5], Some(7)).unwrap(), 5);
    assert_eq!(&buf[..5], b"world");
    fs.close(id).unwrap();
}

#[test]
fn test_open_rules() {
    let (_disk, fs) = formatted();
    fs.mkdir("/dir").unwrap();
    assert_eq!(fs.open("/dir", flags("r"), 0o666), Err(VfsError::IsDirectory));
    assert_eq!(fs.open("/nope", flags("r"), 0o666), Err(VfsError::NotFound));
    assert_eq!(fs.open("/nope", flags("w+"), 0o666), Err(VfsError::NotFound));
    assert_eq!(
        fs.open("/missing/file", flags("w"), 0o666),
        Err(VfsError::NotFound)
    );
    assert_eq!(
        fs.open("/a", OpenFlags::empty(), 0o666),
        Err(VfsError::InvalidArgument)
    );

    let id = fs.open("/a", flags("wx"), 0o666).unwrap();
    fs.close(id).unwrap();
    assert_eq!(fs.open("/a", flags("wx"), 0o666), Err(VfsError::AlreadyExists));
    assert_eq!(
        fs.open("/a/child", flags("w"), 0o666),
        Err(VfsError::NotDirectory)
    );
}

#[test]
fn test_capability_checks() {
    let (_disk, fs) = formatted();
    let id = fs.open("/a", flags("w"), 0o666).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(fs.read(id, &mut buf, None), Err(VfsError::BadFileDescriptor));
    fs.close(id).unwrap();

    let id = fs.open("/a", flags("r"), 0o666).unwrap();
    assert_eq!(fs.write(id, b"x", None), Err(VfsError::BadFileDescriptor));
    fs.close(id).unwrap();
    assert_eq!(fs.close(id), Err(VfsError::BadFileDescriptor));
}

#[test]
fn test_truncate_and_append() {
    let (_disk, fs) = formatted();
    let id = fs.open("/log", flags("w"), 0o666).unwrap();
    fs.write(id, b"first", None).unwrap();
    fs.close(id).unwrap();

    let id = fs.open("/log", flags("a"), 0o666).unwrap();
    fs.write(id, b"+second", Some(0)).unwrap();
    fs.close(id).unwrap();
    assert_eq!(fs.stat("/log").unwrap().size, 12);

    let id = fs.open("/log", flags("w"), 0o666).unwrap();
    assert_eq!(fs.stat("/log").unwrap().size, 0);
    fs.close(id).unwrap();
}

#[test]
fn test_positional_write_extends() {
    let (_disk, fs) = formatted();
    let id = fs.open("/sparse", flags("w"), 0o666).unwrap();
    fs.write(id, b"end", Some(4)).unwrap();
    fs.close(id).unwrap();

    let id = fs.open("/sparse", flags("r"), 0o666).unwrap();
    let mut buf = [0xffu8; 7];
    assert_eq!(fs.read(id, &mut buf, None).unwrap(), 7);
    assert_eq!(&buf, b"\0\0\0\0end");
}

#[test]
fn test_directories() {
    let (_disk, fs) = formatted();
    fs.mkdir("/dir").unwrap();
    fs.mkdir("/dir/sub").unwrap();
    assert_eq!(fs.mkdir("/dir"), Err(VfsError::AlreadyExists));
    assert_eq!(fs.mkdir("/"), Err(VfsError::AlreadyExists));
    assert_eq!(fs.mkdir("/x/y"), Err(VfsError::NotFound));

    let id = fs.open("/dir/file", flags("w"), 0o666).unwrap();
    fs.close(id).unwrap();
    assert_eq!(fs.readdir("/dir").unwrap(), vec!["file", "sub"]);
    assert_eq!(fs.readdir("/dir/file"), Err(VfsError::NotDirectory));
    assert_eq!(fs.readdir("/none"), Err(VfsError::NotFound));

    assert_eq!(fs.rmdir("/dir"), Err(VfsError::DirectoryNotEmpty));
    assert_eq!(fs.rmdir("/dir/file"), Err(VfsError::NotDirectory));
    assert_eq!(fs.rmdir("/"), Err(VfsError::InvalidArgument));
    fs.rmdir("/dir/sub").unwrap();
    assert_eq!(fs.unlink("/dir"), Err(VfsError::IsDirectory));
    fs.unlink("/dir/file").unwrap();
    fs.rmdir("/dir").unwrap();
    assert!(fs.readdir("/").unwrap().is_empty());
}

#[test]
fn test_rename() {
    let (_disk, fs) = formatted();
    fs.mkdir("/a").unwrap();
    fs.mkdir("/a/b").unwrap();
    let id = fs.open("/a/b/f", flags("w"), 0o666).unwrap();
    fs.write(id, b"data", None).unwrap();

    fs.rename("/a", "/c").unwrap();
    assert_eq!(fs.stat("/a"), Err(VfsError::NotFound));
    assert_eq!(fs.stat("/c/b/f"), Ok(Stat::file(4)));

    // 打开的文件跟随改名
    fs.write(id, b"!", None).unwrap();
    fs.close(id).unwrap();
    assert_eq!(fs.stat("/c/b/f").unwrap().size, 5);

    assert_eq!(fs.rename("/c", "/c/b/x"), Err(VfsError::InvalidArgument));
    assert_eq!(fs.rename("/nope", "/x"), Err(VfsError::NotFound));
    assert_eq!(fs.rename("/c", "/c"), Ok(()));
}

#[test]
fn test_rename_onto_existing() {
    let (_disk, fs) = formatted();
    for name in ["/x", "/y"] {
        let id = fs.open(name, flags("w"), 0o666).unwrap();
        fs.write(id, name.as_bytes(), None).unwrap();
        fs.close(id).unwrap();
    }
    fs.rename("/x", "/y").unwrap();
    assert_eq!(fs.readdir("/").unwrap(), vec!["y"]);

    fs.mkdir("/full").unwrap();
    fs.mkdir("/full/inner").unwrap();
    fs.mkdir("/empty").unwrap();
    assert_eq!(fs.rename("/y", "/empty"), Err(VfsError::IsDirectory));
    assert_eq!(fs.rename("/empty", "/y"), Err(VfsError::NotDirectory));
    assert_eq!(fs.rename("/empty", "/full"), Err(VfsError::DirectoryNotEmpty));
    fs.rename("/full", "/empty").unwrap();
    assert_eq!(fs.readdir("/empty").unwrap(), vec!["inner"]);
}

#[test]
fn test_name_too_long() {
    let (_disk, fs) = formatted();
    let name = format!("/{}", "n".repeat(256));
    assert_eq!(fs.mkdir(&name), Err(VfsError::NameTooLong));
    assert_eq!(fs.open(&name, flags("w"), 0o666), Err(VfsError::NameTooLong));

    let name = format!("/{}", "n".repeat(255));
    fs.mkdir(&name).unwrap();
}

#[test]
fn test_persists_across_remount() {
    let (disk, fs) = formatted();
    fs.mkdir("/dir").unwrap();
    let id = fs.open("/dir/f", flags("w"), 0o666).unwrap();
    fs.write(id, &[1, 2, 3], None).unwrap();
    fs.close(id).unwrap();
    fs.unmount().unwrap();

    let fs = BlockFs::new(disk);
    fs.mount().unwrap();
    assert_eq!(fs.readdir("/").unwrap(), vec!["dir"]);
    assert_eq!(fs.stat("/dir/f"), Ok(Stat::file(3)));
}

#[test]
fn test_no_space_keeps_tree() {
    // 两块 × 64 字节：镜像容量只有 64 字节
    let disk = RamDisk::new(64, 2);
    let fs = BlockFs::new(disk.clone());
    fs.mkfs().unwrap();
    fs.mount().unwrap();

    let id = fs.open("/f", flags("w"), 0o666).unwrap();
    fs.write(id, &[7u8; 40], None).unwrap();
    assert_eq!(fs.write(id, &[8u8; 40], None), Err(VfsError::NoSpace));
    fs.close(id).unwrap();
    assert_eq!(fs.stat("/f"), Ok(Stat::file(40)));

    // 设备上的内容同样保持一致
    let fs = BlockFs::new(disk);
    fs.mount().unwrap();
    assert_eq!(fs.stat("/f"), Ok(Stat::file(40)));
}

#[test]
fn test_corrupted_image() {
    let (disk, fs) = formatted();
    fs.unmount().unwrap();
    // 破坏根目录标签
    assert!(disk.write(1, &[9], 0));
    let fs = BlockFs::new(disk);
    assert_eq!(fs.mount(), Err(VfsError::Corrupted));
}

#[test]
fn test_geometry_mismatch() {
    let (disk, _fs) = formatted();
    let mut raw = disk.raw_data();
    raw.truncate(4096 * 8);
    let smaller = RamDisk::from_bytes(raw, 4096);
    let fs = BlockFs::new(smaller);
    assert_eq!(fs.mount(), Err(VfsError::Corrupted));
}

#[test]
fn test_mkfs_while_mounted_resets_tree() {
    let (_disk, fs) = formatted();
    fs.mkdir("/dir").unwrap();
    fs.mkfs().unwrap();
    assert!(fs.readdir("/").unwrap().is_empty());
}

#[test]
fn test_positional_write_beyond_capacity() {
    let (_disk, fs) = formatted();
    let id = fs.open("/f", flags("w"), 0o666).unwrap();
    fs.write(id, b"keep", None).unwrap();

    assert_eq!(fs.write(id, b"x", Some(usize::MAX)), Err(VfsError::NoSpace));
    assert_eq!(fs.write(id, b"x", Some(1 << 20)), Err(VfsError::NoSpace));
    // 容量是 15 × 4096，越过容量一个字节
    assert_eq!(fs.write(id, b"x", Some(15 * 4096)), Err(VfsError::NoSpace));

    // 失败的写入不移动游标，也不改变文件
    fs.write(id, b"!", None).unwrap();
    fs.close(id).unwrap();
    assert_eq!(fs.stat("/f"), Ok(Stat::file(5)));
}
