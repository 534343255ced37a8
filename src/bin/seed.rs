use anyhow::Context;
use applicant_tracker::{
    config::Config,
    database::pool::{create_pool, run_migrations},
    dto::{
        candidate_dto::UpdateCandidatePayload,
        review_dto::{PhaseOneReview, PhaseTwoReview},
    },
    models::{
        candidate::{CandidateStatus, NewCandidate},
        review::{MAX_RATING, MIN_RATING},
    },
    services::{
        candidate_service::CandidateService, review_service::ReviewService,
        user_service::UserService,
    },
    utils::crypto::hash_password,
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rust_decimal::Decimal;
use serde_json::{json, Map, Value as JsonValue};
use tracing::info;

const DEFAULT_USERS: [&str; 2] = ["admin", "recruiter"];

const DEFAULT_TAGS: [&str; 8] = [
    "backend",
    "frontend",
    "devops",
    "rust",
    "go",
    "python",
    "react",
    "docker",
];

const DEFAULT_SAMPLE_CANDIDATES: usize = 25;
const SAMPLE_UUID_PREFIX: &str = "seed-";

const FIRST_NAMES: [&str; 10] = [
    "Giulia", "Marco", "Sara", "Luca", "Elena", "Davide", "Chiara", "Paolo", "Anna", "Matteo",
];
const LAST_NAMES: [&str; 10] = [
    "Rossi", "Bianchi", "Ferrari", "Esposito", "Romano", "Colombo", "Ricci", "Marino", "Greco",
    "Conti",
];

const RATED_CRITERIA: [&str; 4] = [
    "technical_skills",
    "problem_solving",
    "communication",
    "culture_fit",
];

const PHASE_ONE_NOTES: [&str; 4] = [
    "Solid fundamentals, worth a second round.",
    "Good communicator, technical depth to be verified.",
    "Take-home project was clean and well tested.",
    "Some gaps on system design.",
];
const PHASE_TWO_COMMENTS: [&str; 3] = [
    "Strong final interview.",
    "Team fit confirmed by the panel.",
    "Borderline, discussed with the hiring manager.",
];

/// One generated applicant, ready to push through the services.
#[derive(Debug, Clone)]
struct SampleCandidate {
    uuid: String,
    sender: String,
    answers: Map<String, JsonValue>,
    tags: Vec<String>,
    outcome: CandidateStatus,
}

fn sample_candidate(rng: &mut impl Rng) -> SampleCandidate {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Alex");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Moretti");
    let handle = format!("{}{}", first, last).to_lowercase();

    let mut answers = Map::new();
    answers.insert("screen_0_TextInput_0".into(), json!(format!("{} {}", first, last)));
    answers.insert(
        "screen_0_TextInput_1".into(),
        json!(format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase())),
    );
    answers.insert("screen_0_TextInput_4".into(), json!(format!("github.com/{}", handle)));

    let tag_count = rng.gen_range(2..=6);
    let tags = DEFAULT_TAGS
        .choose_multiple(rng, tag_count)
        .map(|t| t.to_string())
        .collect();

    let outcome = *[
        CandidateStatus::Pending,
        CandidateStatus::Reviewed,
        CandidateStatus::Rejected,
    ]
    .choose(rng)
    .unwrap_or(&CandidateStatus::Pending);

    SampleCandidate {
        uuid: format!("{}{:016x}", SAMPLE_UUID_PREFIX, rng.gen::<u64>()),
        sender: format!("+39{}", rng.gen_range(3_000_000_000u64..4_000_000_000)),
        answers,
        tags,
        outcome,
    }
}

fn sample_phase_one(rng: &mut impl Rng) -> PhaseOneReview {
    let criteria_ratings = RATED_CRITERIA
        .iter()
        .map(|c| (c.to_string(), json!(rng.gen_range(MIN_RATING..=MAX_RATING))))
        .collect();
    PhaseOneReview {
        criteria_ratings,
        notes: PHASE_ONE_NOTES.choose(rng).map(|n| n.to_string()),
    }
}

fn sample_phase_two(rng: &mut impl Rng) -> PhaseTwoReview {
    let final_score = Decimal::new(rng.gen_range(70..=100), 1);
    PhaseTwoReview {
        final_score,
        hire_decision: hire_decision(final_score),
        final_comment: PHASE_TWO_COMMENTS.choose(rng).map(|c| c.to_string()),
    }
}

fn hire_decision(final_score: Decimal) -> bool {
    final_score > Decimal::new(75, 1)
}

fn sample_count() -> anyhow::Result<usize> {
    match std::env::var("SEED_CANDIDATES") {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("SEED_CANDIDATES must be a number, got {:?}", raw)),
        _ => Ok(DEFAULT_SAMPLE_CANDIDATES),
    }
}

async fn seed_candidates(
    pool: &sqlx::PgPool,
    reviewer_ids: &[i32],
    wanted: usize,
) -> anyhow::Result<usize> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM candidates WHERE uuid LIKE $1")
        .bind(format!("{}%", SAMPLE_UUID_PREFIX))
        .fetch_one(pool)
        .await
        .context("counting sample candidates")?;
    let missing = wanted.saturating_sub(usize::try_from(existing).unwrap_or(usize::MAX));

    let candidates = CandidateService::new(pool.clone());
    let reviews = ReviewService::new(pool.clone());
    let mut rng = StdRng::from_entropy();

    for _ in 0..missing {
        let sample = sample_candidate(&mut rng);
        let new = NewCandidate::from_answers(sample.uuid.clone(), sample.sender, sample.answers);
        let detail = candidates
            .ingest(new, &sample.tags)
            .await
            .with_context(|| format!("seeding candidate {}", sample.uuid))?;
        let id = detail.candidate.id;

        if sample.outcome == CandidateStatus::Pending {
            continue;
        }
        let Some(&reviewer) = reviewer_ids.choose(&mut rng) else {
            continue;
        };

        reviews
            .create_phase_one(id, reviewer, sample_phase_one(&mut rng))
            .await
            .with_context(|| format!("phase 1 review for candidate {}", id))?;

        match sample.outcome {
            CandidateStatus::Reviewed => {
                reviews
                    .create_phase_two(id, reviewer, sample_phase_two(&mut rng))
                    .await
                    .with_context(|| format!("phase 2 review for candidate {}", id))?;
            }
            CandidateStatus::Rejected => {
                let payload = UpdateCandidatePayload {
                    status: Some(CandidateStatus::Rejected),
                    ..Default::default()
                };
                candidates
                    .update(id, payload)
                    .await
                    .with_context(|| format!("rejecting candidate {}", id))?;
            }
            CandidateStatus::Pending => {}
        }
    }

    Ok(missing)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let pool = create_pool(&config).await?;
    run_migrations(&pool).await?;

    let password = std::env::var("SEED_PASSWORD")
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "password123".to_string());

    let users = UserService::new(pool.clone());
    let mut reviewer_ids = Vec::with_capacity(DEFAULT_USERS.len());
    for username in DEFAULT_USERS {
        let hash = hash_password(&password)
            .map_err(|e| anyhow::anyhow!("hashing password for {}: {}", username, e))?;
        let user = users
            .upsert(username, &hash)
            .await
            .with_context(|| format!("seeding user {}", username))?;
        info!(user_id = user.id, username, "user ready");
        reviewer_ids.push(user.id);
    }

    let mut created = 0;
    for name in DEFAULT_TAGS {
        let result = sqlx::query("INSERT INTO tags (name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(name)
            .execute(&pool)
            .await
            .with_context(|| format!("seeding tag {}", name))?;
        created += result.rows_affected();
    }
    info!(created, total = DEFAULT_TAGS.len(), "tags ready");

    let wanted = sample_count()?;
    let created = seed_candidates(&pool, &reviewer_ids, wanted).await?;
    info!(created, wanted, "sample candidates ready");

    pool.close().await;
    Ok(())
}
