//! Terminal rendering for the dashboard's list and notifications.

use client_core::{DashboardEvent, NoticeLevel, Notification};
use shared::domain::PatientRecord;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Prints every notification queued on `rx`. Errors go to stderr.
pub fn flush_notices(rx: &mut broadcast::Receiver<DashboardEvent>) {
    loop {
        match rx.try_recv() {
            Ok(DashboardEvent::Notice(notice)) => print_notice(&notice),
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
}

pub fn print_notice(notice: &Notification) {
    match notice.level {
        NoticeLevel::Success => println!("{}", notice.message),
        NoticeLevel::Error => eprintln!("error: {}", notice.message),
    }
}

pub fn render_patients(patients: &[PatientRecord]) -> String {
    if patients.is_empty() {
        return "No patients found.\n".to_string();
    }

    let headers = ["ID", "NAME", "AGE", "AILMENT", "EMAIL"];
    let rows: Vec<[String; 5]> = patients
        .iter()
        .map(|p| {
            [
                p.id.to_string(),
                p.name.clone(),
                p.age.map(|age| age.to_string()).unwrap_or_else(|| "-".into()),
                p.ailment.clone(),
                p.email.clone(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &headers.map(str::to_owned), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use shared::domain::PatientId;

    use super::*;

    #[test]
    fn renders_aligned_columns() {
        let patients = vec![
            PatientRecord {
                id: PatientId::new("42"),
                name: "Jane Doe".into(),
                age: Some(34),
                ailment: "flu".into(),
                email: "j@x.com".into(),
            },
            PatientRecord {
                id: PatientId::new("7"),
                name: "A".into(),
                age: None,
                ailment: "cold".into(),
                email: "a@x.com".into(),
            },
        ];

        let table = render_patients(&patients);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "ID  NAME      AGE  AILMENT  EMAIL");
        assert_eq!(lines[1], "42  Jane Doe  34   flu      j@x.com");
        assert_eq!(lines[2], "7   A         -    cold     a@x.com");
    }

    #[test]
    fn empty_list_has_placeholder() {
        assert_eq!(render_patients(&[]), "No patients found.\n");
    }
}
