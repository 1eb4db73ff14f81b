use std::fs;

use anyhow::{Context, Result};
use colored::*;
use syncml_dbapi::Engine;
use syncml_dbapi::datastore::Token;
use syncml_dbapi::plugin::ReadOutcome;
use syncml_dbapi::registry::default_module_config_path;

use crate::cli_args::{ReadArgs, SyncTarget};

fn engine(config: Option<&str>) -> Result<Engine> {
    let path = match config {
        Some(p) => p.to_string(),
        None => default_module_config_path()
            .to_str()
            .context("default module config path is not valid UTF-8")?
            .to_string(),
    };
    let engine = Engine::from_config_path(&path)
        .with_context(|| format!("loading module configuration from {path}"))?;
    engine.load_modules();
    Ok(engine)
}

/// Opens `target`'s datastore on `engine` and runs `body`, always
/// closing the datastore, session, and module afterwards -- even if
/// `body` returns an error -- mirroring the engine's reverse-order
/// shutdown sequence (spec.md §4.D).
fn with_datastore<T>(
    engine: &Engine,
    target: &SyncTarget,
    body: impl FnOnce(&syncml_dbapi::context::datastore::DatastoreHandle) -> Result<T>,
) -> Result<T> {
    let module = engine
        .create_module(&target.module)
        .with_context(|| format!("creating module context for '{}'", target.module))?;
    let session = engine.open_session(module);

    let result = (|| {
        let datastore_id = engine
            .create_datastore(
                module,
                &target.datastore,
                &target.device,
                &target.user,
                target.admin,
            )
            .with_context(|| format!("creating datastore context for '{}'", target.datastore))?;
        let handle = engine.datastore(datastore_id).context("datastore vanished immediately after creation")?;
        let outcome = body(&handle);
        let close = engine.close_datastore(datastore_id);
        outcome.and(close.map_err(anyhow::Error::from))
    })();

    engine.close_session(session).ok();
    engine.delete_module(module).ok();
    result
}

pub fn write(target: &SyncTarget, config: Option<&str>) -> Result<()> {
    let engine = engine(config)?;
    with_datastore(&engine, target, |handle| {
        handle.start_data_write().context("StartDataWrite")?;
        for path in &target.inserts {
            let data = fs::read(path).with_context(|| format!("reading {path}"))?;
            let new_id = handle.insert_item(&data).with_context(|| format!("InsertItem for {path}"))?;
            println!("{} {} -> {}", "inserted".bright_green(), path, new_id.bold());
        }
        let token = handle.end_data_write(true).context("EndDataWrite")?;
        println!("{} {}", "new anchor token:".dimmed(), token);
        Ok(())
    })
}

pub fn read(args: &ReadArgs, config: Option<&str>) -> Result<()> {
    let engine = engine(config)?;
    let last_token = Token::new(args.last_token.clone());
    let resume_token = Token::new(args.resume_token.clone());

    with_datastore(&engine, &args.target, |handle| {
        handle
            .start_data_read(&last_token, &resume_token)
            .context("StartDataRead")?;

        let mut count = 0usize;
        loop {
            match handle.read_next_item().context("ReadNextItem")? {
                ReadOutcome::Eof => break,
                ReadOutcome::Item {
                    local_id,
                    token,
                    changed,
                    resumed,
                    data,
                } => {
                    count += 1;
                    let status = if resumed {
                        "Resumed".bright_yellow()
                    } else if changed {
                        "Changed".bright_green()
                    } else {
                        "Unchanged".dimmed()
                    };
                    println!(
                        "{:<10} {:<24} token={:<18} {} bytes",
                        status,
                        local_id,
                        token.as_str(),
                        data.len()
                    );
                }
            }
        }
        handle.end_data_read().context("EndDataRead")?;
        println!("{}", format!("{count} item(s)").dimmed());
        Ok(())
    })
}
