use crate::config::RunConfig;
use crate::error::Result;
use crate::fs::{BufferPool, DirHandle, FileType, NameId, RecordCursor};
use crate::index::NameIndex;

/**
 Enumerates `dir` and fills `index` with the names of its regular files.

 The reader side: each round grows the pool by one fresh buffer of the same
 estimated capacity and runs one `getdents64` batch into it, until the
 kernel signals exhaustion with a zero read. Buffers are deliberately never
 resized or recycled - the index borrows every surviving name in place, so
 earlier buffers must stay exactly where they are.

 The classifier side: records are walked by their declared lengths, the
 `.`/`..` pseudo-entries are dropped, the entry type is resolved from the
 inline tag (with the configurable stat fallback for `DT_UNKNOWN`), and
 everything that is not a regular file is ignored without being counted.

 Returns the total number of regular files indexed, the figure the
 end-of-scan summary reports. Every failure underneath - syscall, buffer
 allocation, corrupt record, index growth - propagates as fatal.
*/
pub fn scan_directory(
    dir: &DirHandle,
    pool: &mut BufferPool,
    index: &mut NameIndex,
    config: &RunConfig,
) -> Result<u64> {
    let capacity = dir.buffer_capacity_hint();
    let mut total_files = 0u64;
    loop {
        let buffer_index = pool.grow(capacity)?;
        let read = dir.read_entries_into(pool.buffer_mut(buffer_index))?;
        if read == 0 {
            break;
        }
        total_files += classify_buffer(dir, pool, index, config, buffer_index)?;
    }
    Ok(total_files)
}

/// Walks one filled buffer and inserts its qualifying names.
fn classify_buffer(
    dir: &DirHandle,
    pool: &BufferPool,
    index: &mut NameIndex,
    config: &RunConfig,
    buffer_index: u32,
) -> Result<u64> {
    let filled = pool.filled(buffer_index);
    let mut cursor = RecordCursor::new(filled);
    let mut inserted = 0u64;

    while let Some(record) = cursor.next_record()? {
        let name = record.name(filled);
        // Dont print thisdir and parent dir
        if name == b"." || name == b".." {
            continue;
        }

        let id = NameId {
            buffer: buffer_index,
            offset: record.name_offset,
            len: record.name_len,
        };

        // if the inline tag is DT_UNKNOWN, make an fstatat call to determine
        // (skipping the syscall when the tag resolves is a massive perf win)
        let file_type = match FileType::from_dtype(record.type_tag) {
            FileType::Unknown if config.stat_fallback => dir
                .mode_of(pool.name_cstr(id))
                .map_or(FileType::Unknown, FileType::from_mode),
            resolved => resolved,
        };
        if !file_type.is_regular_file() {
            continue;
        }

        if index.insert(id, pool)? {
            inserted += 1;
        }
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SortOrder;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sorted_names(dir: &DirHandle, config: &RunConfig) -> (Vec<Vec<u8>>, u64) {
        let mut pool = BufferPool::new();
        let mut index = NameIndex::new(SortOrder::Ascending);
        let total = scan_directory(dir, &mut pool, &mut index, config).unwrap();
        let mut names = Vec::new();
        index
            .traverse(|id| {
                names.push(pool.name(id).to_vec());
                Ok(())
            })
            .unwrap();
        (names, total)
    }

    #[test]
    fn collects_exactly_the_regular_files_in_order() {
        let dir_path = scratch("dsweep_scan_basic_test");
        std::fs::write(dir_path.join("b.txt"), "b").unwrap();
        std::fs::write(dir_path.join("a.txt"), "a").unwrap();
        std::fs::write(dir_path.join("c.txt"), "c").unwrap();
        std::fs::create_dir(dir_path.join("sub")).unwrap();

        let dir = DirHandle::open(dir_path.as_os_str()).unwrap();
        let config = RunConfig::from_lookup(|_| None).unwrap();
        let (names, total) = sorted_names(&dir, &config);

        assert_eq!(total, 3);
        assert_eq!(
            names,
            vec![b"a.txt".to_vec(), b"b.txt".to_vec(), b"c.txt".to_vec()]
        );

        let _ = std::fs::remove_dir_all(&dir_path);
    }

    #[test]
    fn empty_directory_scans_to_nothing() {
        let dir_path = scratch("dsweep_scan_empty_test");
        let dir = DirHandle::open(dir_path.as_os_str()).unwrap();
        let config = RunConfig::from_lookup(|_| None).unwrap();
        let (names, total) = sorted_names(&dir, &config);
        assert_eq!(total, 0);
        assert!(names.is_empty());
        let _ = std::fs::remove_dir_all(&dir_path);
    }

    #[test]
    fn symlinks_and_subdirs_are_never_counted() {
        let dir_path = scratch("dsweep_scan_types_test");
        std::fs::write(dir_path.join("real"), "x").unwrap();
        std::fs::create_dir(dir_path.join("child")).unwrap();
        std::os::unix::fs::symlink("real", dir_path.join("alias")).unwrap();
        // a dangling symlink must be skipped too, not die in the classifier
        std::os::unix::fs::symlink("nowhere", dir_path.join("dangling")).unwrap();

        let dir = DirHandle::open(dir_path.as_os_str()).unwrap();
        let config = RunConfig::from_lookup(|_| None).unwrap();
        let (names, total) = sorted_names(&dir, &config);
        assert_eq!(total, 1);
        assert_eq!(names, vec![b"real".to_vec()]);

        let _ = std::fs::remove_dir_all(&dir_path);
    }

    #[test]
    fn scan_is_idempotent_over_an_unchanged_directory() {
        let dir_path = scratch("dsweep_scan_idem_test");
        for name in ["one", "two", "three", "four"] {
            std::fs::write(dir_path.join(name), name).unwrap();
        }
        let config = RunConfig::from_lookup(|_| None).unwrap();

        let dir = DirHandle::open(dir_path.as_os_str()).unwrap();
        let (first, first_total) = sorted_names(&dir, &config);
        let dir_again = DirHandle::open(dir_path.as_os_str()).unwrap();
        let (second, second_total) = sorted_names(&dir_again, &config);

        assert_eq!(first, second);
        assert_eq!(first_total, second_total);

        let _ = std::fs::remove_dir_all(&dir_path);
    }

    #[test]
    fn many_files_come_back_strictly_ascending_across_buffers() {
        let dir_path = scratch("dsweep_scan_many_test");
        // enough entries that a small-capacity pool needs several buffers
        let mut expected: Vec<Vec<u8>> = Vec::new();
        for n in 0..500u32 {
            let name = format!("entry-{:06}", n.wrapping_mul(2_654_435_761) % 1_000_000);
            if std::fs::write(dir_path.join(&name), "x").is_ok() {
                expected.push(name.into_bytes());
            }
        }
        expected.sort();
        expected.dedup();

        let dir = DirHandle::open(dir_path.as_os_str()).unwrap();
        let config = RunConfig::from_lookup(|_| None).unwrap();
        let (names, total) = sorted_names(&dir, &config);

        assert_eq!(total as usize, expected.len());
        assert_eq!(names, expected);
        for pair in names.windows(2) {
            assert!(pair[0] < pair[1]);
        }

        let _ = std::fs::remove_dir_all(&dir_path);
    }
}
