//! Search, filter and sort over any record type that implements [`Listing`].
//!
//! Stages run in a fixed order: text search, category, derived status, then
//! a stable sort. Only the last stage reorders.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::category::{Vocabulary, ALL_CATEGORIES};
use crate::progress::days_left;
use crate::status::{DerivedStatus, StatusFilter, TimeBounds};

/// What the pipeline and the reducer need to know about a record.
pub trait Listing {
    /// Whether the type carries time bounds and therefore a derived status.
    const TIME_BOUNDED: bool = false;
    /// Whether the type carries a free-text category.
    const CATEGORIZED: bool = false;

    /// Title or name; the alphabetical sort key.
    fn title(&self) -> &str;

    /// Secondary searchable text.
    fn subtitle(&self) -> &str {
        ""
    }

    fn category(&self) -> Option<&str> {
        None
    }

    fn bounds(&self) -> TimeBounds {
        TimeBounds::default()
    }

    fn created_at(&self) -> Option<OffsetDateTime> {
        None
    }

    /// Count used by the `popular` ordering.
    fn popularity(&self) -> u64 {
        0
    }

    fn progress(&self, _now: OffsetDateTime) -> Option<u8> {
        None
    }

    fn derived_status(&self, now: OffsetDateTime) -> DerivedStatus {
        self.bounds().classify(now)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Recent,
    Popular,
    Alphabetical,
}

impl SortKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::Popular => "popular",
            Self::Alphabetical => "alphabetical",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "recent" => Some(Self::Recent),
            "popular" => Some(Self::Popular),
            "alphabetical" => Some(Self::Alphabetical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterParams {
    pub search_text: String,
    pub category: String,
    pub status: StatusFilter,
    pub sort: SortKey,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            category: ALL_CATEGORIES.to_string(),
            status: StatusFilter::All,
            sort: SortKey::default(),
        }
    }
}

/// Case-folded, diacritic-free form used for alphabetical ordering.
#[must_use]
pub fn collation_key(value: &str) -> String {
    value.nfd().filter(|ch| !is_combining_mark(*ch)).flat_map(char::to_lowercase).collect()
}

fn contains_text<T: Listing>(record: &T, needle: &str) -> bool {
    record.title().to_lowercase().contains(needle)
        || record.subtitle().to_lowercase().contains(needle)
}

fn sort_listings<T: Listing>(items: &mut [&T], key: SortKey) {
    match key {
        SortKey::Recent => items.sort_by(|lhs, rhs| rhs.created_at().cmp(&lhs.created_at())),
        SortKey::Popular => items.sort_by(|lhs, rhs| rhs.popularity().cmp(&lhs.popularity())),
        SortKey::Alphabetical => items.sort_by_cached_key(|item| collation_key(item.title())),
    }
}

/// Run the pipeline against the built-in vocabulary.
pub fn apply<'a, T, I>(records: I, params: &FilterParams, now: OffsetDateTime) -> Vec<&'a T>
where
    I: IntoIterator<Item = &'a T>,
    T: Listing + 'a,
{
    apply_with(records, params, Vocabulary::builtin(), now)
}

/// Run the pipeline. Returns borrowed records; the input is left untouched.
pub fn apply_with<'a, T, I>(
    records: I,
    params: &FilterParams,
    vocabulary: &Vocabulary,
    now: OffsetDateTime,
) -> Vec<&'a T>
where
    I: IntoIterator<Item = &'a T>,
    T: Listing + 'a,
{
    let needle = params.search_text.trim().to_lowercase();
    let mut selected: Vec<&'a T> = records.into_iter().collect();
    let input = selected.len();

    if !needle.is_empty() {
        selected.retain(|record| contains_text(*record, &needle));
    }
    let after_search = selected.len();

    selected.retain(|record| vocabulary.matches(record.category(), &params.category));
    let after_category = selected.len();

    if params.status != StatusFilter::All {
        selected.retain(|record| params.status.admits(record.derived_status(now)));
    }

    sort_listings(&mut selected, params.sort);

    tracing::debug!(
        input,
        after_search,
        after_category,
        shown = selected.len(),
        status = params.status.as_str(),
        sort = params.sort.as_str(),
        "applied listing pipeline"
    );

    selected
}

/// Values derived for display; recomputed on every call.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Derived {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DerivedStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_left: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl Derived {
    #[must_use]
    pub fn of<T: Listing>(record: &T, vocabulary: &Vocabulary, now: OffsetDateTime) -> Self {
        let (status, remaining) = if T::TIME_BOUNDED {
            (Some(record.derived_status(now)), days_left(record.bounds().end, now))
        } else {
            (None, None)
        };

        Self {
            status,
            category: T::CATEGORIZED.then(|| vocabulary.canonicalize(record.category())),
            days_left: remaining,
            progress: record.progress(now),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Annotated<'a, T> {
    #[serde(flatten)]
    pub record: &'a T,
    pub derived: Derived,
}

/// Pair each record with its derived values, preserving order.
pub fn annotate<'a, T, I>(
    records: I,
    vocabulary: &Vocabulary,
    now: OffsetDateTime,
) -> Vec<Annotated<'a, T>>
where
    I: IntoIterator<Item = &'a T>,
    T: Listing + 'a,
{
    records
        .into_iter()
        .map(|record| Annotated { record, derived: Derived::of(record, vocabulary, now) })
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use time::Duration;

    use super::*;
    use crate::records::{ChallengeRecord, RecordId};

    fn fixture_time() -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(1_700_000_000)
    }

    fn mk_challenge(id: &str, title: &str, category: Option<&str>) -> ChallengeRecord {
        ChallengeRecord {
            id: RecordId::from(id),
            title: title.to_string(),
            description: String::new(),
            category: category.map(str::to_string),
            start_date: None,
            end_date: None,
            created_at: None,
            participants_count: 0,
        }
    }

    fn ids(records: &[&ChallengeRecord]) -> Vec<String> {
        records.iter().map(|record| record.id.to_string()).collect()
    }

    fn titles(records: &[&ChallengeRecord]) -> Vec<String> {
        records.iter().map(|record| record.title.clone()).collect()
    }

    fn mixed_fixture() -> Vec<ChallengeRecord> {
        let now = fixture_time();
        let mut upcoming = mk_challenge("c1", "Nettoyage de plage", Some("environnement"));
        upcoming.description = "Ramasser les déchets sur la côte".to_string();
        upcoming.start_date = Some(now + Duration::days(3));
        upcoming.created_at = Some(now - Duration::days(1));
        upcoming.participants_count = 12;

        let mut active = mk_challenge("c2", "Course solidaire", Some("Sportif"));
        active.start_date = Some(now - Duration::days(2));
        active.end_date = Some(now + Duration::days(5));
        active.created_at = Some(now - Duration::days(10));
        active.participants_count = 40;

        let mut completed = mk_challenge("c3", "Atelier peinture", Some("Créatif"));
        completed.start_date = Some(now - Duration::days(20));
        completed.end_date = Some(now - Duration::days(13));
        completed.created_at = Some(now - Duration::days(30));
        completed.participants_count = 40;

        let mut unbounded = mk_challenge("c4", "Jardin partagé", Some("Nature"));
        unbounded.description = "Potager collectif".to_string();
        unbounded.participants_count = 3;

        let undated = mk_challenge("c5", "écriture libre", None);

        vec![upcoming, active, completed, unbounded, undated]
    }

    #[test]
    fn default_params_only_sort() {
        let records = mixed_fixture();
        let shown = apply(&records, &FilterParams::default(), fixture_time());
        assert_eq!(ids(&shown), vec!["c1", "c2", "c3", "c4", "c5"]);
    }

    #[test]
    fn search_matches_title_or_description_case_insensitively() {
        let records = mixed_fixture();
        let params = FilterParams { search_text: "  POTAGER ".to_string(), ..FilterParams::default() };
        assert_eq!(ids(&apply(&records, &params, fixture_time())), vec!["c4"]);

        let params = FilterParams { search_text: "déchets".to_string(), ..FilterParams::default() };
        assert_eq!(ids(&apply(&records, &params, fixture_time())), vec!["c1"]);
    }

    #[test]
    fn whitespace_search_is_identity() {
        let records = mixed_fixture();
        let params = FilterParams { search_text: " \t ".to_string(), ..FilterParams::default() };
        assert_eq!(apply(&records, &params, fixture_time()).len(), records.len());
    }

    #[test]
    fn category_filter_uses_aliases() {
        let records = mixed_fixture();
        let params = FilterParams { category: "Écologique".to_string(), ..FilterParams::default() };
        assert_eq!(ids(&apply(&records, &params, fixture_time())), vec!["c1", "c4"]);
    }

    #[test]
    fn status_filter_uses_explicit_now() {
        let records = mixed_fixture();
        let now = fixture_time();
        let only = |status| FilterParams {
            status: StatusFilter::Only(status),
            ..FilterParams::default()
        };

        assert_eq!(ids(&apply(&records, &only(DerivedStatus::Upcoming), now)), vec!["c1"]);
        assert_eq!(ids(&apply(&records, &only(DerivedStatus::Active), now)), vec!["c2", "c4", "c5"]);
        assert_eq!(ids(&apply(&records, &only(DerivedStatus::Completed), now)), vec!["c3"]);

        let later = now + Duration::days(6);
        assert_eq!(
            ids(&apply(&records, &only(DerivedStatus::Completed), later)),
            vec!["c2", "c3"]
        );
    }

    #[test]
    fn recent_sort_puts_missing_creation_last() {
        let records = mixed_fixture();
        let params = FilterParams { sort: SortKey::Recent, ..FilterParams::default() };
        let shown = apply(records.iter().rev(), &params, fixture_time());
        assert_eq!(ids(&shown), vec!["c1", "c2", "c3", "c5", "c4"]);
    }

    #[test]
    fn popular_sort_is_descending_and_stable() {
        let records = mixed_fixture();
        let params = FilterParams { sort: SortKey::Popular, ..FilterParams::default() };
        let shown = apply(&records, &params, fixture_time());
        assert_eq!(ids(&shown), vec!["c2", "c3", "c1", "c4", "c5"]);

        let reversed = apply(records.iter().rev(), &params, fixture_time());
        assert_eq!(ids(&reversed), vec!["c3", "c2", "c1", "c4", "c5"]);
    }

    #[test]
    fn alphabetical_sort_ignores_case() {
        let records = vec![
            mk_challenge("a", "Banane", None),
            mk_challenge("b", "ananas", None),
            mk_challenge("c", "Cerise", None),
        ];
        let params = FilterParams { sort: SortKey::Alphabetical, ..FilterParams::default() };
        assert_eq!(titles(&apply(&records, &params, fixture_time())), vec!["ananas", "Banane", "Cerise"]);
    }

    #[test]
    fn alphabetical_sort_folds_accents_and_keeps_duplicates_in_order() {
        let records = vec![
            mk_challenge("1", "Zumba", None),
            mk_challenge("2", "Écriture", None),
            mk_challenge("3", "ecole", None),
            mk_challenge("4", "Écriture", None),
            mk_challenge("5", "", None),
        ];
        let params = FilterParams { sort: SortKey::Alphabetical, ..FilterParams::default() };
        assert_eq!(ids(&apply(&records, &params, fixture_time())), vec!["5", "3", "2", "4", "1"]);
    }

    #[test]
    fn annotate_derives_display_values() {
        let records = mixed_fixture();
        let annotated = annotate(&records, Vocabulary::builtin(), fixture_time());
        assert_eq!(annotated.len(), records.len());
        assert_eq!(annotated[0].derived.status, Some(DerivedStatus::Upcoming));
        assert_eq!(annotated[0].derived.category.as_deref(), Some("Écologique"));
        assert_eq!(annotated[0].derived.days_left, None);
        assert_eq!(annotated[1].derived.days_left, Some(5));
        assert_eq!(annotated[2].derived.days_left, Some(0));
        assert_eq!(annotated[4].derived.category.as_deref(), Some("General"));
    }

    fn arbitrary_challenges() -> impl Strategy<Value = Vec<ChallengeRecord>> {
        let titles = prop::sample::select(vec!["Banane", "ananas", "Cerise", "banane", "Éclair", ""]);
        let categories = prop::option::of(prop::sample::select(vec![
            "nature", "Sportif", "art", "Santé", "Gastronomie",
        ]));
        let offset = || prop::option::of(-40_i64..40_i64);
        prop::collection::vec(
            (titles, categories, offset(), offset(), offset(), 0_u64..5),
            0..24,
        )
        .prop_map(|rows| {
            let now = fixture_time();
            rows.into_iter()
                .enumerate()
                .map(|(index, (title, category, start, end, created, count))| ChallengeRecord {
                    id: RecordId::from(format!("c{index}")),
                    title: title.to_string(),
                    description: String::new(),
                    category: category.map(str::to_string),
                    start_date: start.map(|days| now + Duration::days(days)),
                    end_date: end.map(|days| now + Duration::days(days)),
                    created_at: created.map(|days| now + Duration::days(days)),
                    participants_count: count,
                })
                .collect()
        })
    }

    fn arbitrary_params() -> impl Strategy<Value = FilterParams> {
        (
            prop::sample::select(vec!["", "an", "CER", " e "]),
            prop::sample::select(vec!["all", "Écologique", "Bien-être", "Sportif"]),
            prop::sample::select(vec!["all", "upcoming", "active", "completed"]),
            prop::sample::select(vec![SortKey::Recent, SortKey::Popular, SortKey::Alphabetical]),
        )
            .prop_map(|(search, category, status, sort)| FilterParams {
                search_text: search.to_string(),
                category: category.to_string(),
                status: StatusFilter::parse(status).unwrap_or_default(),
                sort,
            })
    }

    proptest! {
        #[test]
        fn property_filter_is_idempotent(records in arbitrary_challenges(), params in arbitrary_params()) {
            let now = fixture_time();
            let once = apply(&records, &params, now);
            let twice = apply(once.iter().copied(), &params, now);
            prop_assert_eq!(ids(&once), ids(&twice));
        }

        #[test]
        fn property_identity_filters_depend_only_on_sort(records in arbitrary_challenges(), params in arbitrary_params(), seed in any::<u64>()) {
            let now = fixture_time();
            let identity = FilterParams { sort: params.sort, ..FilterParams::default() };

            let mut expected: Vec<&ChallengeRecord> = records.iter().collect();
            match params.sort {
                SortKey::Recent => expected.sort_by(|l, r| r.created_at.cmp(&l.created_at)),
                SortKey::Popular => expected.sort_by(|l, r| r.participants_count.cmp(&l.participants_count)),
                SortKey::Alphabetical => expected.sort_by_key(|record| collation_key(&record.title)),
            }

            let mut shuffled: Vec<&ChallengeRecord> = records.iter().collect();
            shuffled.sort_by_key(|record| {
                let mut hash = seed ^ 0x9E37_79B9_7F4A_7C15;
                for byte in record.id.to_string().bytes() {
                    hash = (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01B3);
                }
                hash
            });

            let shown = apply(shuffled.iter().copied(), &identity, now);
            prop_assert_eq!(shown.len(), records.len());
            let sort_key = |record: &&ChallengeRecord| match params.sort {
                SortKey::Recent => format!("{:?}", record.created_at),
                SortKey::Popular => record.participants_count.to_string(),
                SortKey::Alphabetical => collation_key(&record.title),
            };
            prop_assert_eq!(
                shown.iter().map(sort_key).collect::<Vec<_>>(),
                expected.iter().map(sort_key).collect::<Vec<_>>()
            );
        }

        #[test]
        fn property_filters_only_narrow(records in arbitrary_challenges(), params in arbitrary_params()) {
            let now = fixture_time();
            let shown = apply(&records, &params, now);
            prop_assert!(shown.len() <= records.len());
            for record in shown {
                prop_assert!(params.status.admits(record.derived_status(now)));
                prop_assert!(Vocabulary::builtin().matches(record.category.as_deref(), &params.category));
            }
        }
    }
}
