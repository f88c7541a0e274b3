use crate::database::models::{AttendanceRecord, RecordType};

#[derive(Debug, Clone)]
pub struct Shift {
    pub entrada: AttendanceRecord,
    /// `None` while the shift is still in progress.
    pub salida: Option<AttendanceRecord>,
}

impl Shift {
    /// Worked hours of a closed shift.
    pub fn duration_hours(&self) -> Option<f64> {
        self.salida.as_ref().map(|salida| {
            let millis = salida
                .timestamp
                .signed_duration_since(self.entrada.timestamp)
                .num_milliseconds();
            millis as f64 / 3_600_000.0
        })
    }
}

#[derive(Debug, Clone)]
pub struct UserShifts {
    pub user_id: i64,
    pub shifts: Vec<Shift>,
}

/// Pairs each entrada, in order, with the first unused salida strictly after it.
///
/// This is a greedy match, not an optimal one: an earlier entrada may take the
/// salida a later entrada would have been closer to.
pub fn pair_shifts(records: &[AttendanceRecord]) -> Vec<Shift> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let (entradas, mut salidas): (Vec<_>, Vec<_>) = sorted
        .into_iter()
        .partition(|r| r.record_type == RecordType::Entrada);

    entradas
        .into_iter()
        .map(|entrada| {
            let salida = salidas
                .iter()
                .position(|s| s.timestamp > entrada.timestamp)
                .map(|idx| salidas.remove(idx));

            if salida.is_none() {
                tracing::debug!(record_id = entrada.id, user_id = entrada.user_id, "Shift in progress");
            }

            Shift { entrada, salida }
        })
        .collect()
}

/// Groups a day listing by user (first-seen order) and pairs each group.
pub fn group_by_user(records: &[AttendanceRecord]) -> Vec<UserShifts> {
    let mut groups: Vec<(i64, Vec<AttendanceRecord>)> = Vec::new();

    for record in records {
        match groups.iter_mut().find(|(user_id, _)| *user_id == record.user_id) {
            Some((_, group)) => group.push(record.clone()),
            None => groups.push((record.user_id, vec![record.clone()])),
        }
    }

    groups
        .into_iter()
        .map(|(user_id, group)| UserShifts {
            user_id,
            shifts: pair_shifts(&group),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::record_validator::tests::record;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    #[test]
    fn greedy_match_leaves_later_entrada_open() {
        let records = vec![
            record(1, RecordType::Entrada, at(9, 0)),
            record(2, RecordType::Entrada, at(9, 5)),
            record(3, RecordType::Salida, at(9, 10)),
        ];

        let shifts = pair_shifts(&records);
        assert_eq!(shifts.len(), 2);
        assert_eq!(shifts[0].entrada.id, 1);
        assert_eq!(shifts[0].salida.as_ref().map(|s| s.id), Some(3));
        assert_eq!(shifts[1].entrada.id, 2);
        assert!(shifts[1].salida.is_none());
    }

    #[test]
    fn salida_must_be_strictly_after_entrada() {
        let records = vec![
            record(1, RecordType::Salida, at(9, 0)),
            record(2, RecordType::Entrada, at(9, 0)),
            record(3, RecordType::Salida, at(13, 0)),
        ];

        let shifts = pair_shifts(&records);
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].salida.as_ref().map(|s| s.id), Some(3));
    }

    #[test]
    fn unsorted_input_is_paired_chronologically() {
        let records = vec![
            record(4, RecordType::Salida, at(18, 0)),
            record(3, RecordType::Entrada, at(14, 0)),
            record(2, RecordType::Salida, at(13, 0)),
            record(1, RecordType::Entrada, at(9, 0)),
        ];

        let pairs: Vec<(i64, Option<i64>)> = pair_shifts(&records)
            .iter()
            .map(|s| (s.entrada.id, s.salida.as_ref().map(|r| r.id)))
            .collect();
        assert_eq!(pairs, vec![(1, Some(2)), (3, Some(4))]);
    }

    #[test]
    fn duration_of_closed_shift_in_hours() {
        let records = vec![
            record(1, RecordType::Entrada, at(9, 0)),
            record(2, RecordType::Salida, at(17, 30)),
        ];
        let shifts = pair_shifts(&records);
        assert_eq!(shifts[0].duration_hours(), Some(8.5));
    }

    #[test]
    fn groups_keep_first_seen_user_order() {
        let mut a = record(1, RecordType::Entrada, at(9, 0));
        a.user_id = 20;
        let mut b = record(2, RecordType::Entrada, at(9, 1));
        b.user_id = 10;
        let mut c = record(3, RecordType::Salida, at(17, 0));
        c.user_id = 20;

        let groups = group_by_user(&[a, b, c]);
        assert_eq!(groups.iter().map(|g| g.user_id).collect::<Vec<_>>(), vec![20, 10]);
        assert!(groups[0].shifts[0].salida.is_some());
        assert!(groups[1].shifts[0].salida.is_none());
    }
}
