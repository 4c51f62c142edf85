//! Board API server command — `taskboard serve`.

use anyhow::Result;

pub async fn cmd_serve(
    port: u16,
    init: bool,
    db_path: std::path::PathBuf,
    dev: bool,
) -> Result<()> {
    if init {
        // Just initialize the database
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        taskboard::board::db::BoardDb::new(&db_path)?;
        println!("Board database initialized at {}", db_path.display());
        return Ok(());
    }

    taskboard::board::server::start_server(taskboard::board::server::ServerConfig {
        port,
        db_path,
        dev_mode: dev,
    })
    .await?;

    Ok(())
}
