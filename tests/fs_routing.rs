// File routing against a real directory through FsStorage and FsMaterializer.

use std::fs;
use std::sync::Arc;

use editbridge::config::BridgeSettings;
use editbridge::host::{EditorBuffer, FsMaterializer, FsStorage, MemoryBuffer, MemoryHost};
use editbridge::{BufferPosition, ChangeRecord, RelativePath, SessionBridge, run_session};
use tempfile::TempDir;

fn pos(line: usize, column: usize) -> BufferPosition {
    BufferPosition::new(line, column)
}

struct Project {
    dir: TempDir,
    bridge: SessionBridge,
    active: Arc<MemoryBuffer>,
}

/// Project with `a.js` open (unsaved content "live") and `b.txt` on disk.
fn project() -> Project {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.js"), "on disk").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();

    let host = Arc::new(MemoryHost::new(dir.path()));
    let active = Arc::new(MemoryBuffer::with_path(dir.path().join("a.js"), "live"));
    host.focus(Arc::clone(&active));

    let (bridge, _events) = SessionBridge::new(
        host,
        Arc::new(FsStorage::new()),
        Arc::new(FsMaterializer::new()),
        BridgeSettings::default(),
    );
    bridge.start().unwrap();

    Project {
        dir,
        bridge,
        active,
    }
}

#[tokio::test]
async fn test_change_to_closed_file_is_written_to_disk() {
    let project = project();

    project
        .bridge
        .change(
            &RelativePath::from_wire("/b.txt").unwrap(),
            &ChangeRecord::replace(pos(0, 5), pos(0, 5), " world"),
        )
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(project.dir.path().join("b.txt")).unwrap(),
        "hello world"
    );
    assert_eq!(project.active.content(), "live");
}

#[tokio::test]
async fn test_change_to_active_file_stays_in_memory() {
    let project = project();

    project
        .bridge
        .change(
            &RelativePath::from_wire("a.js").unwrap(),
            &ChangeRecord::replace(pos(0, 0), pos(0, 0), "still "),
        )
        .await
        .unwrap();

    assert_eq!(project.active.content(), "still live");
    assert_eq!(
        fs::read_to_string(project.dir.path().join("a.js")).unwrap(),
        "on disk"
    );
}

#[tokio::test]
async fn test_create_directory_and_file_in_it() {
    let project = project();

    project
        .bridge
        .create_directory(&RelativePath::from_wire("src/nested").unwrap())
        .await
        .unwrap();
    project
        .bridge
        .create_file(&RelativePath::from_wire("/src/nested/c.rs").unwrap(), "fn c() {}")
        .await
        .unwrap();

    let created = project.dir.path().join("src/nested/c.rs");
    assert_eq!(fs::read_to_string(created).unwrap(), "fn c() {}");
}

#[tokio::test]
async fn test_delete_file_and_directory() {
    let project = project();
    fs::create_dir_all(project.dir.path().join("old/inner")).unwrap();
    fs::write(project.dir.path().join("old/inner/x.txt"), "x").unwrap();

    project
        .bridge
        .delete_file(&RelativePath::from_wire("b.txt").unwrap())
        .await
        .unwrap();
    project
        .bridge
        .delete_file(&RelativePath::from_wire("old").unwrap())
        .await
        .unwrap();

    assert!(!project.dir.path().join("b.txt").exists());
    assert!(!project.dir.path().join("old").exists());
}

#[tokio::test]
async fn test_deleting_missing_file_reports_storage_error() {
    let project = project();

    let err = project
        .bridge
        .delete_file(&RelativePath::from_wire("nope.txt").unwrap())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("nope.txt"));
}

#[tokio::test]
async fn test_conversions_for_closed_files_read_current_disk_content() {
    let project = project();
    let b = RelativePath::from_wire("b.txt").unwrap();

    assert_eq!(
        project.bridge.position_from_offset(&b, 99).await.unwrap(),
        pos(0, 5)
    );

    fs::write(project.dir.path().join("b.txt"), "x\ny").unwrap();
    assert_eq!(
        project.bridge.position_from_offset(&b, 2).await.unwrap(),
        pos(1, 0)
    );
    assert_eq!(
        project
            .bridge
            .offset_from_position(&RelativePath::from_wire("new.txt").unwrap(), pos(3, 3))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_session_rejects_root_and_parent_paths_on_disk() {
    let outer = TempDir::new().unwrap();
    let root = outer.path().join("project");
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/keep.rs"), "keep").unwrap();

    let host = Arc::new(MemoryHost::new(&root));
    let (bridge, mut events) = SessionBridge::new(
        host,
        Arc::new(FsStorage::new()),
        Arc::new(FsMaterializer::new()),
        BridgeSettings::default(),
    );
    bridge.start().unwrap();

    let input = [
        r#"{"type":"deleteFile","path":"/"}"#,
        r#"{"type":"deleteFile","path":"src/.."}"#,
        r#"{"type":"createFile","path":"../outside.txt","content":"x"}"#,
    ]
    .join("\n");
    let mut output = Vec::new();
    run_session(&bridge, &mut events, input.as_bytes(), &mut output)
        .await
        .unwrap();

    let output = String::from_utf8(output).unwrap();
    assert_eq!(output.lines().count(), 3);
    assert!(output.lines().all(|line| line.contains(r#""type":"error""#)));
    assert_eq!(fs::read_to_string(root.join("src/keep.rs")).unwrap(), "keep");
    assert!(!outer.path().join("outside.txt").exists());
}

#[tokio::test]
async fn test_crlf_files_convert_and_change_as_if_normalized() {
    let project = project();
    fs::write(project.dir.path().join("crlf.txt"), "ab\r\ncd").unwrap();
    let crlf = RelativePath::from_wire("crlf.txt").unwrap();

    assert_eq!(
        project
            .bridge
            .offset_from_position(&crlf, pos(1, 0))
            .await
            .unwrap(),
        3
    );
    assert_eq!(
        project.bridge.position_from_offset(&crlf, 4).await.unwrap(),
        pos(1, 1)
    );

    project
        .bridge
        .change(&crlf, &ChangeRecord::replace(pos(1, 2), pos(1, 2), "\nef"))
        .await
        .unwrap();
    assert_eq!(
        fs::read_to_string(project.dir.path().join("crlf.txt")).unwrap(),
        "ab\r\ncd\r\nef"
    );
}
