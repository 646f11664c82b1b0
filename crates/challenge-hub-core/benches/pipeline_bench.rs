use challenge_hub_core::{
    aggregate, apply, ChallengeRecord, DerivedStatus, FilterParams, RecordId, SortKey,
    StatusFilter,
};
use criterion::{criterion_group, criterion_main, Criterion};
use time::{Duration, OffsetDateTime};

const CATEGORIES: [&str; 6] = ["nature", "Sportif", "entraide", "musique", "santé", "formation"];

fn mk_challenge(index: usize, now: OffsetDateTime) -> ChallengeRecord {
    let offset = i64::try_from(index % 60).unwrap_or_default() - 30;
    ChallengeRecord {
        id: RecordId::from(format!("bench-{index}")),
        title: format!("Défi numéro {index}"),
        description: "Relever le défi collectif de la semaine".to_string(),
        category: Some(CATEGORIES[index % CATEGORIES.len()].to_string()),
        start_date: Some(now + Duration::days(offset)),
        end_date: Some(now + Duration::days(offset + 7)),
        created_at: Some(now - Duration::hours(i64::try_from(index).unwrap_or_default())),
        participants_count: u64::try_from(index % 97).unwrap_or_default(),
    }
}

fn bench_pipeline(c: &mut Criterion) {
    let now = OffsetDateTime::UNIX_EPOCH + Duration::seconds(1_700_000_000);
    let records = (0..5_000).map(|index| mk_challenge(index, now)).collect::<Vec<_>>();
    let params = FilterParams {
        search_text: "défi".to_string(),
        category: "Écologique".to_string(),
        status: StatusFilter::Only(DerivedStatus::Active),
        sort: SortKey::Alphabetical,
    };

    c.bench_function("pipeline_5000_challenges", |b| {
        b.iter(|| apply(&records, &params, now));
    });

    c.bench_function("aggregate_5000_challenges", |b| {
        b.iter(|| aggregate(&records, now));
    });
}

criterion_group!(pipeline_benches, bench_pipeline);
criterion_main!(pipeline_benches);
