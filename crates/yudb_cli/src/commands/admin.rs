//! Backup, restore, and credential commands.

use super::print_json;
use std::fs;
use std::path::Path;
use tracing::info;
use yudb_core::{BackupManager, BackupMetadata, Shell};

/// Back up every database to the configured backup file.
pub fn backup(shell: &Shell) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = shell.backup()?;
    print_json(&metadata)
}

/// Replace every database with the contents of the backup file.
pub fn restore(shell: &mut Shell) -> Result<(), Box<dyn std::error::Error>> {
    let stats = shell.restore()?;
    print_json(&stats)
}

/// Validate the backup file without restoring it.
pub fn verify_backup(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("Validating backup {:?}", path);

    let data = fs::read(path)?;
    let manager = BackupManager::new();
    if !manager.validate_backup(&data)? {
        println!("✗ Backup is invalid or corrupted");
        return Err("Backup validation failed".into());
    }

    let metadata = manager.read_metadata(&data)?;
    println!("✓ Backup is valid");
    print_metadata(&metadata);
    Ok(())
}

/// Prompt for a new username and apply it.
pub fn change_username(shell: &Shell) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&shell.change_username()?)
}

/// Prompt for the old and new password and apply the change.
pub fn change_password(shell: &Shell) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&shell.change_password()?)
}

fn print_metadata(metadata: &BackupMetadata) {
    println!("  File size: {} bytes", metadata.size);
    println!("  Record count: {}", metadata.record_count);
    println!("  Created: {}", format_timestamp(metadata.timestamp));
}

fn format_timestamp(ms: u64) -> String {
    let total = ms / 1000;
    let days = total / 86_400;
    let hours = (total / 3600) % 24;
    let mins = (total / 60) % 60;
    let secs = total % 60;
    format!("{days} days, {hours:02}:{mins:02}:{secs:02} since epoch")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_formatting() {
        assert_eq!(format_timestamp(0), "0 days, 00:00:00 since epoch");
        assert_eq!(
            format_timestamp((86_400 + 3600 + 61) * 1000 + 999),
            "1 days, 01:01:01 since epoch"
        );
    }
}
