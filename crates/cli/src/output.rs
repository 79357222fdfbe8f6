use console::style;
use gardener::{Note, NoteKind, SeedStatus};

pub fn note(note: &Note) {
    match note.kind {
        NoteKind::Seeding => println!("{} {}", style("Seeding:").yellow(), note.message),
        NoteKind::Seeded => println!("{} {}", style("Seeded:").green(), note.message),
        NoteKind::RollingBack => println!("{} {}", style("Rolling back:").yellow(), note.message),
        NoteKind::RolledBack => println!("{} {}", style("Rolled back:").green(), note.message),
        NoteKind::Pretend => println!("{}", style(&note.message).dim()),
        NoteKind::Info => println!("{}", style(&note.message).cyan()),
    }
}

pub fn notes(notes: &[Note]) {
    for item in notes {
        note(item);
    }
}

pub fn info(message: &str) {
    println!("{}", style(message).green());
}

pub fn comment(message: &str) {
    println!("{}", style(message).yellow());
}

pub fn error(error: &anyhow::Error) {
    eprintln!("{} {:#}", style("error:").red().bold(), error);
}

/// Render seed statuses as an aligned table
pub fn status_table(statuses: &[SeedStatus]) -> String {
    let width = statuses
        .iter()
        .map(|status| status.seed.len())
        .max()
        .unwrap_or(0)
        .max("Seed".len());

    let mut lines = vec![
        format!("{:<4}  {:<width$}  {}", "Ran?", "Seed", "Batch", width = width),
        format!("{}  {}  {}", "-".repeat(4), "-".repeat(width), "-".repeat(5)),
    ];

    for status in statuses {
        let ran = if status.ran { "Yes" } else { "No" };
        let batch = status
            .batch
            .map(|batch| batch.to_string())
            .unwrap_or_default();
        let missing = if status.present { "" } else { " (missing)" };
        lines.push(format!(
            "{:<4}  {:<width$}  {}{}",
            ran,
            status.seed,
            batch,
            missing,
            width = width
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        let table = status_table(&[
            SeedStatus {
                seed: "2024_01_01_000000_users".to_string(),
                ran: true,
                batch: Some(1),
                present: true,
            },
            SeedStatus {
                seed: "2024_01_02_000000_roles".to_string(),
                ran: false,
                batch: None,
                present: true,
            },
        ]);

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Ran?  Seed"));
        assert_eq!(lines[2], "Yes   2024_01_01_000000_users  1");
        assert_eq!(lines[3].trim_end(), "No    2024_01_02_000000_roles");
    }
}
