use super::ensure_race;
use super::ranking::{RankingEngine, RankingQuery, Visibility};
use crate::dto::leaderboard::Leaderboard;
use crate::error::Result;
use crate::models::{Points, RaceId, ResultKind};

const INDIVIDUAL_HEADER: [&str; 4] = ["rank", "name", "total_time", "points"];
const TEAM_HEADER: [&str; 5] = [
    "rank",
    "team_name",
    "average_total_time",
    "points",
    "member_count",
];

/// Full public leaderboard as CSV, one row per ranked entry.
#[derive(Clone)]
pub struct CsvExporter {
    engine: RankingEngine,
}

impl CsvExporter {
    pub fn new(engine: RankingEngine) -> Self {
        Self { engine }
    }

    pub async fn export(&self, race_id: Option<RaceId>, kind: ResultKind) -> Result<String> {
        ensure_race(self.engine.results().as_ref(), race_id).await?;

        let query = RankingQuery::new(kind, Visibility::PublicOnly)
            .race(race_id)
            .unpaginated();
        let board = self.engine.rank(&query).await?;

        tracing::debug!("Exporting {} {} leaderboard row(s) as CSV", board.total(), kind);

        Ok(render(&board))
    }
}

/// `leaderboard-<race id or "all">-<kind>.csv`
pub fn export_filename(race_id: Option<RaceId>, kind: ResultKind) -> String {
    let scope = race_id.map_or_else(|| "all".to_string(), |id| id.to_string());
    format!("leaderboard-{}-{}.csv", scope, kind)
}

fn render(board: &Leaderboard) -> String {
    let mut csv = String::new();

    match board {
        Leaderboard::Individual(view) => {
            write_record(&mut csv, &INDIVIDUAL_HEADER);
            for entry in &view.data {
                write_record(
                    &mut csv,
                    &[
                        &entry.rank.to_string(),
                        &entry.name,
                        &entry.total_time.to_string(),
                        &points_cell(entry.points),
                    ],
                );
            }
        }
        Leaderboard::Team(view) => {
            write_record(&mut csv, &TEAM_HEADER);
            for entry in &view.data {
                write_record(
                    &mut csv,
                    &[
                        &entry.rank.to_string(),
                        &entry.team_name,
                        &entry.average_total_time.to_string(),
                        &points_cell(entry.points),
                        &entry.member_count.to_string(),
                    ],
                );
            }
        }
    }

    csv
}

fn points_cell(points: Points) -> String {
    points.value().map(|value| value.to_string()).unwrap_or_default()
}

fn write_record(out: &mut String, fields: &[&str]) {
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        write_field(out, field);
    }
    out.push('\n');
}

fn write_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::StorageError;
    use crate::repository::MemoryStore;

    fn exporter(store: &Arc<MemoryStore>) -> CsvExporter {
        CsvExporter::new(RankingEngine::new(store.clone(), store.clone()))
    }

    #[tokio::test]
    async fn test_individual_export() {
        let store = Arc::new(MemoryStore::new());
        store.add_race(1, "R1", None);
        store.add_participant(1, "User", "A", true);
        store.add_participant(2, "User", "B", true);
        store.add_participant(3, "Hidden", "C", false);
        let a = store.add_individual_result(1, 1, 3600, 0);
        store.add_individual_result(2, 1, 3700, 30);
        store.add_individual_result(3, 1, 3000, 0);
        store.set_points(a, Points::Computed(100));

        let csv = exporter(&store)
            .export(Some(1), ResultKind::Individual)
            .await
            .unwrap();

        assert_eq!(
            csv,
            "rank,name,total_time,points\n1,User A,3600,100\n2,User B,3730,\n"
        );
    }

    #[tokio::test]
    async fn test_row_count_matches_visible_entries() {
        let store = Arc::new(MemoryStore::new());
        store.add_race(1, "R1", None);
        for id in 1..=30 {
            store.add_participant(id, "Runner", &id.to_string(), id % 5 != 0);
            store.add_individual_result(id, 1, 4000 + id, 0);
        }

        let csv = exporter(&store)
            .export(None, ResultKind::Individual)
            .await
            .unwrap();

        assert_eq!(csv.lines().count() - 1, 24);
    }

    #[tokio::test]
    async fn test_team_export_columns() {
        let store = Arc::new(MemoryStore::new());
        store.add_race(1, "Relay", None);
        store.add_team(1, "Fast, Furious", true, &[1, 2, 3]);
        store.add_team_result(1, 1, "3600.5".parse().unwrap(), "10".parse().unwrap(), 3);

        let csv = exporter(&store).export(None, ResultKind::Team).await.unwrap();

        assert_eq!(
            csv,
            "rank,team_name,average_total_time,points,member_count\n1,\"Fast, Furious\",3610.5,,3\n"
        );
    }

    #[tokio::test]
    async fn test_empty_export_has_header_only() {
        let store = Arc::new(MemoryStore::new());
        store.add_race(1, "R1", None);

        let csv = exporter(&store)
            .export(Some(1), ResultKind::Individual)
            .await
            .unwrap();

        assert_eq!(csv, "rank,name,total_time,points\n");
    }

    #[tokio::test]
    async fn test_unknown_race_is_rejected() {
        let store = Arc::new(MemoryStore::new());

        let err = exporter(&store)
            .export(Some(3), ResultKind::Team)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::InvalidScope(_)));
    }

    #[test]
    fn test_quotes_are_doubled() {
        let mut out = String::new();
        write_record(&mut out, &["1", "Jean \"The Rocket\" Dupont"]);
        assert_eq!(out, "1,\"Jean \"\"The Rocket\"\" Dupont\"\n");
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            export_filename(Some(4), ResultKind::Team),
            "leaderboard-4-team.csv"
        );
        assert_eq!(
            export_filename(None, ResultKind::Individual),
            "leaderboard-all-individual.csv"
        );
    }
}
