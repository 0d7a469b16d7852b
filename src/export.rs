use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::collector::CatalogEntry;
use crate::error::{Error, Result};
use crate::trends::TrendRow;

/// Today's raw snapshot, one row per catalog entry.
pub fn export_today_csv(entries: &[CatalogEntry], path: &Path) -> Result<()> {
    let mut file = File::create(path)?;

    writeln!(
        file,
        "app_id,title,release_date,publisher,price,is_free,genres,player_count,store_link"
    )?;
    for e in entries {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{}",
            csv_field(&e.app_id),
            csv_field(&e.title),
            csv_field(&e.release_date),
            csv_field(&e.publisher),
            csv_field(&e.price),
            if e.is_free { "yes" } else { "no" },
            csv_field(&e.genres),
            e.player_count,
            store_link(&e.app_id)
        )?;
    }

    Ok(())
}

pub fn export_trends_csv(rows: &[TrendRow], path: &Path) -> Result<()> {
    let mut file = File::create(path)?;

    writeln!(
        file,
        "app_id,title,latest_players,oldest_players,pct_change,samples_in_window,store_link"
    )?;
    for row in rows {
        writeln!(
            file,
            "{},{},{},{},{:.2},{},{}",
            csv_field(&row.app_id),
            csv_field(&row.title),
            row.latest_players,
            row.oldest_players.map(|v| v.to_string()).unwrap_or_default(),
            row.pct_change,
            row.samples_in_window,
            store_link(&row.app_id)
        )?;
    }

    Ok(())
}

/// The watchlist shares the trend row shape; only the selection differs.
pub fn export_watchlist_csv(rows: &[TrendRow], path: &Path) -> Result<()> {
    export_trends_csv(rows, path)
}

pub fn export_trends_json(rows: &[TrendRow], path: &Path) -> Result<()> {
    let json_str = serde_json::to_string_pretty(rows)
        .map_err(|e| Error::Parse(format!("Failed to serialize JSON: {}", e)))?;

    let mut file = File::create(path)?;
    file.write_all(json_str.as_bytes())?;

    Ok(())
}

fn store_link(app_id: &str) -> String {
    format!("https://store.steampowered.com/app/{}/", app_id)
}

/// Minimal RFC 4180 quoting. Game titles do contain commas and quotes.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn row(app_id: &str, title: &str, oldest: Option<u64>, pct: f64) -> TrendRow {
        TrendRow {
            app_id: app_id.to_string(),
            title: title.to_string(),
            latest_players: 150,
            oldest_players: oldest,
            pct_change: pct,
            samples_in_window: if oldest.is_some() { 2 } else { 1 },
        }
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_trends_csv_rounds_and_leaves_missing_oldest_blank() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trends.csv");
        let rows = vec![
            row("10", "Riser", Some(100), 50.0),
            row("20", "New, Untracked", None, 0.0),
        ];
        export_trends_csv(&rows, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("150,100,50.00,2"));
        assert!(lines[2].contains("\"New, Untracked\""));
        assert!(lines[2].contains("150,,0.00,1"));
    }

    #[test]
    fn test_today_csv_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("today.csv");
        let entries = vec![CatalogEntry {
            app_id: "548430".to_string(),
            title: "Deep Rock".to_string(),
            player_count: 12000,
            release_date: "13 May, 2020".to_string(),
            publisher: "Coffee Stain".to_string(),
            price: "$29.99".to_string(),
            is_free: false,
            genres: "Action, Co-op".to_string(),
        }];
        export_today_csv(&entries, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("app_id,title,"));
        assert!(content.contains("\"13 May, 2020\""));
        assert!(content.contains("store.steampowered.com/app/548430/"));
    }

    #[test]
    fn test_trends_json_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trends.json");
        export_trends_json(&[row("10", "Riser", Some(100), 50.0)], &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["app_id"], "10");
        assert_eq!(value[0]["oldest_players"], 100);
    }
}
