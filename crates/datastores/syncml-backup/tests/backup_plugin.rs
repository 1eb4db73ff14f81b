//! End-to-end scenarios against `BackupPlugin` directly, without the
//! module/session layers above it (those are exercised in
//! `syncml-dbapi`'s own tests).

use syncml_backup::{BackupConfig, BackupPlugin};
use syncml_dbapi::datastore::{MapRecord, Token};
use syncml_dbapi::plugin::{DatastorePlugin, ReadOutcome};

fn plugin() -> (BackupPlugin, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let plugin = BackupPlugin::new(BackupConfig::new(dir.path()));
    (plugin, dir)
}

#[test]
fn single_item_insert_read_cycle() {
    let (plugin, _dir) = plugin();
    let ctx = plugin.create_context("contacts", "dev1", "user1", false).unwrap();

    plugin.start_data_write(ctx).unwrap();
    let id = plugin
        .insert_item(ctx, b"N_FIRST:Alice\nN_LAST:Smith")
        .unwrap();
    assert_eq!(id, "10000");
    let t1 = plugin.end_data_write(ctx, true).unwrap();
    assert!(!t1.as_str().is_empty());

    plugin.start_data_read(ctx, &Token::zero(), &Token::zero()).unwrap();
    match plugin.read_next_item(ctx).unwrap() {
        ReadOutcome::Item { local_id, changed, .. } => {
            assert_eq!(local_id, "10000");
            assert!(changed);
        }
        ReadOutcome::Eof => panic!("expected an item"),
    }
    assert!(matches!(plugin.read_next_item(ctx).unwrap(), ReadOutcome::Eof));
    plugin.end_data_read(ctx).unwrap();

    plugin.start_data_read(ctx, &t1, &Token::zero()).unwrap();
    match plugin.read_next_item(ctx).unwrap() {
        ReadOutcome::Item { changed, .. } => assert!(!changed),
        ReadOutcome::Eof => {}
    }
    plugin.end_data_read(ctx).unwrap();
}

#[test]
fn map_table_insert_duplicate_and_delete() {
    let (plugin, _dir) = plugin();
    let ctx = plugin.create_context("contacts", "dev1", "user1", false).unwrap();

    let record = MapRecord {
        local_id: "10000".to_string(),
        remote_id: "r1".to_string(),
        flags: 0,
        ident: 1,
    };
    plugin.insert_map_item(ctx, record.clone()).unwrap();
    assert!(plugin.insert_map_item(ctx, record.clone()).is_err());

    let first = plugin.read_next_map_item(ctx, true).unwrap().unwrap();
    assert_eq!(first.remote_id, "r1");
    assert!(plugin.read_next_map_item(ctx, false).unwrap().is_none());

    plugin.delete_map_item(ctx, "10000", 1).unwrap();
    assert!(plugin.read_next_map_item(ctx, true).unwrap().is_none());
}

#[test]
fn blob_chunked_round_trip() {
    let (plugin, _dir) = plugin();
    let ctx = plugin.create_context("contacts", "dev1", "user1", false).unwrap();

    let data = vec![0xABu8; 5000];
    plugin
        .write_blob(ctx, "10000", "photo", syncml_dbapi::datastore::BlobChunk {
            data: data[0..2000].to_vec(),
            total_size: 5000,
            first: true,
            last: false,
        })
        .unwrap();
    plugin
        .write_blob(ctx, "10000", "photo", syncml_dbapi::datastore::BlobChunk {
            data: data[2000..4000].to_vec(),
            total_size: 5000,
            first: false,
            last: false,
        })
        .unwrap();
    plugin
        .write_blob(ctx, "10000", "photo", syncml_dbapi::datastore::BlobChunk {
            data: data[4000..5000].to_vec(),
            total_size: 5000,
            first: false,
            last: true,
        })
        .unwrap();

    let mut read_back = Vec::new();
    loop {
        let chunk = plugin.read_blob(ctx, "10000", "photo", 2048).unwrap();
        let last = chunk.last;
        read_back.extend(chunk.data);
        if last {
            break;
        }
    }
    assert_eq!(read_back.len(), 5000);
    assert!(read_back.iter().all(|&b| b == 0xAB));
}

#[test]
fn resume_reports_in_progress_items_as_resumed() {
    let (plugin, _dir) = plugin();
    let ctx = plugin.create_context("contacts", "dev1", "user1", false).unwrap();

    plugin.start_data_write(ctx).unwrap();
    plugin.insert_item(ctx, b"x").unwrap();
    plugin.insert_item(ctx, b"y").unwrap();
    let t1 = plugin.end_data_write(ctx, true).unwrap();

    plugin.start_data_write(ctx).unwrap();
    let z = plugin.insert_item(ctx, b"z").unwrap();
    let _t2 = plugin.end_data_write(ctx, true).unwrap();

    plugin.start_data_write(ctx).unwrap();
    let w = plugin.insert_item(ctx, b"w").unwrap();
    let t3 = plugin.end_data_write(ctx, true).unwrap();

    // Simulates an aborted sync resumed from T3: the engine had last
    // anchored at T1 and was part-way through sending changes up to
    // T3 when it was interrupted. Z's token (T2) lies strictly between
    // T1 and T3, so it must be reported resumed; W's token equals the
    // resume token itself, so it is merely changed, not resumed.
    plugin.start_data_read(ctx, &t1, &t3).unwrap();
    let mut resumed_ids = Vec::new();
    let mut changed_ids = Vec::new();
    loop {
        match plugin.read_next_item(ctx).unwrap() {
            ReadOutcome::Item { local_id, resumed, changed, .. } => {
                if resumed {
                    resumed_ids.push(local_id);
                } else if changed {
                    changed_ids.push(local_id);
                }
            }
            ReadOutcome::Eof => break,
        }
    }
    assert_eq!(resumed_ids, vec![z]);
    assert!(changed_ids.contains(&w));
}

#[test]
fn move_item_rejects_cycles() {
    let (plugin, _dir) = plugin();
    let ctx = plugin.create_context("contacts", "dev1", "user1", false).unwrap();

    plugin.start_data_write(ctx).unwrap();
    let a = plugin.insert_item(ctx, b"a").unwrap();
    let b = plugin.insert_item(ctx, b"b").unwrap();
    plugin.end_data_write(ctx, true).unwrap();

    plugin.start_data_write(ctx).unwrap();
    plugin.move_item(ctx, &b, &a).unwrap();
    assert!(plugin.move_item(ctx, &a, &b).is_err());
    plugin.end_data_write(ctx, true).unwrap();
}

#[test]
fn admin_blob_round_trips_through_context_close_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = BackupConfig::new(dir.path());

    let plugin = BackupPlugin::new(config.clone());
    let ctx = plugin.create_context("contacts", "dev1", "user1", false).unwrap();
    plugin
        .save_admin_data(ctx, "local", "remote", syncml_dbapi::datastore::AdminBlob::new(vec![1, 2, 3]))
        .unwrap();
    plugin.delete_context(ctx).unwrap();

    let plugin2 = BackupPlugin::new(config);
    let ctx2 = plugin2.create_context("contacts", "dev1", "user1", false).unwrap();
    let blob = plugin2.load_admin_data(ctx2, "local", "remote").unwrap();
    assert_eq!(blob.as_bytes(), &[1, 2, 3]);
}
