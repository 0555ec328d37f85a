//! Writers for the recommendation list and the neighbor table.

use anyhow::{Context, Result};
use clap::ValueEnum;
use pipeline::{Neighbor, Recommendation};
use std::io::Write;

/// Serialization of the recommendation list
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human readable line per item
    Text,
    /// Header plus one row per item
    Csv,
    /// Pretty-printed JSON array
    Json,
}

/// Write recommendations in the requested format.
///
/// `explain` only affects the text format: each line is followed by the
/// neighbors that support the item.
pub fn write_recommendations<W: Write>(
    mut out: W,
    recommendations: &[Recommendation],
    format: OutputFormat,
    explain: bool,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for rec in recommendations {
                writeln!(
                    out,
                    "Title: {}, Avg Rating: {:.2}, Recommended by {} Users",
                    rec.title, rec.average_rating, rec.supporting_neighbor_count
                )?;
                if explain {
                    writeln!(out, "    rated by: {}", rec.supporters.join(", "))?;
                }
            }
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut out);
            if recommendations.is_empty() {
                writer.write_record(["item_id", "title", "average_rating", "supporting_neighbor_count"])?;
            }
            for rec in recommendations {
                writer.serialize(rec).context("Failed to write CSV row")?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, recommendations)
                .context("Failed to write JSON")?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Plain table of the neighbor set, most similar first
pub fn write_neighbors<W: Write>(mut out: W, neighbors: &[Neighbor]) -> Result<()> {
    writeln!(out, "{:>4}  {:<24} {:>10} {:>8}", "#", "user", "similarity", "overlap")?;
    for (rank, neighbor) in neighbors.iter().enumerate() {
        writeln!(
            out,
            "{:>4}  {:<24} {:>10.4} {:>8}",
            rank + 1,
            neighbor.user_id,
            neighbor.similarity,
            neighbor.overlap
        )?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recs() -> Vec<Recommendation> {
        vec![
            Recommendation {
                item_id: 300,
                title: "Chinatown".to_string(),
                average_rating: 3.5,
                supporting_neighbor_count: 2,
                supporters: vec!["n1".to_string(), "n2".to_string()],
            },
            Recommendation {
                item_id: 400,
                title: "Dune, Part Two".to_string(),
                average_rating: 5.0,
                supporting_neighbor_count: 1,
                supporters: vec!["n1".to_string()],
            },
        ]
    }

    fn render(format: OutputFormat, explain: bool) -> String {
        let mut buf = Vec::new();
        write_recommendations(&mut buf, &recs(), format, explain).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_format() {
        assert_eq!(
            render(OutputFormat::Text, false),
            "Title: Chinatown, Avg Rating: 3.50, Recommended by 2 Users\n\
             Title: Dune, Part Two, Avg Rating: 5.00, Recommended by 1 Users\n"
        );
    }

    #[test]
    fn test_text_explain() {
        let text = render(OutputFormat::Text, true);
        assert!(text.contains("    rated by: n1, n2\n"));
    }

    #[test]
    fn test_csv_format() {
        let text = render(OutputFormat::Csv, false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "item_id,title,average_rating,supporting_neighbor_count");
        assert_eq!(lines[1], "300,Chinatown,3.5,2");
        assert_eq!(lines[2], "400,\"Dune, Part Two\",5.0,1");
    }

    #[test]
    fn test_csv_empty_still_has_header() {
        let mut buf = Vec::new();
        write_recommendations(&mut buf, &[], OutputFormat::Csv, false).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "item_id,title,average_rating,supporting_neighbor_count\n"
        );
    }

    #[test]
    fn test_json_format() {
        let text = render(OutputFormat::Json, false);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["item_id"], 300);
        assert_eq!(value[0]["supporting_neighbor_count"], 2);
        assert_eq!(value[1]["title"], "Dune, Part Two");
        assert!(value[0].get("supporters").is_none());
    }

    #[test]
    fn test_neighbor_table() {
        let neighbors = vec![Neighbor {
            user_id: "alice".to_string(),
            row: 3,
            similarity: 0.5,
            overlap: 42,
        }];
        let mut buf = Vec::new();
        write_neighbors(&mut buf, &neighbors).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.lines().nth(1).unwrap().contains("alice"));
        assert!(text.contains("0.5000"));
        assert!(text.contains("42"));
    }
}
