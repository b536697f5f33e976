use chrono::NaiveDate;

use sentiscope::config::{PipelineConfig, ThemeScope, VectorizerConfig};
use sentiscope::error::{Result, SentiscopeError};
use sentiscope::pipeline::{Adjustment, Pipeline, ThemeStage};
use sentiscope::review::{Bank, FailureReason, Review, ReviewBatch, SentimentLabel};
use sentiscope::theme::TfIdfVectorizer;

const TEXTS: &[&str] = &[
    "Great app, love the fast transfers",
    "The app keeps crashing after the update",
    "Login fails every time, OTP never arrives",
    "Very easy to use and the design is nice",
    "Transfers are slow and sometimes fail",
    "Customer support was helpful and quick",
    "Worst banking app ever, it crashes constantly",
    "Balance does not refresh, very annoying",
    "Good app but the login is slow",
    "Excellent service, transfers work perfectly",
    "",
    "Cannot register, the verification code fails",
    "Nice interface, fast and reliable",
    "Transaction failed but money was deducted",
    "The update broke fingerprint login",
    "Best mobile banking app in Ethiopia",
    "App is ok",
    "Please add dark mode",
];

fn reviews(texts: &[&str]) -> Vec<Review> {
    let banks = [Bank::Cbe, Bank::Boa, Bank::Dashen];
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let date = NaiveDate::from_ymd_opt(2024, 1 + (i % 6) as u32, 1 + i as u32).unwrap();
            Review::new(*text, 1 + (i % 5) as u8, date, banks[i % 3], "Google Play Store").unwrap()
        })
        .collect()
}

fn corpus_batch() -> ReviewBatch {
    ReviewBatch::new("corpus", reviews(TEXTS))
}

#[test]
fn every_review_is_enriched_in_input_order() -> Result<()> {
    let pipeline = Pipeline::new(PipelineConfig::default())?;
    let batch = corpus_batch();
    let analyzed = pipeline.run(&batch)?;

    assert_eq!(analyzed.len(), batch.len());
    for (i, (input, output)) in batch.reviews.iter().zip(&analyzed.reviews).enumerate() {
        assert_eq!(output.index, i);
        assert_eq!(&output.review, input);
    }

    let failed: Vec<usize> = analyzed.failed().map(|r| r.index).collect();
    assert_eq!(failed, vec![10]);
    assert_eq!(
        analyzed.reviews[10].failure,
        Some(FailureReason::EmptyContent)
    );
    assert_eq!(analyzed.summary.analysed + analyzed.summary.failed, TEXTS.len());
    Ok(())
}

#[test]
fn theme_assignments_stay_within_fitted_space() -> Result<()> {
    let pipeline = Pipeline::new(PipelineConfig::default())?;
    let analyzed = pipeline.run(&corpus_batch())?;

    let partition = &analyzed.summary.partitions[0];
    assert_eq!(partition.partition, None);
    assert!(partition.n_clusters >= 1 && partition.n_clusters <= 10);
    assert!(partition.n_components <= 10);

    for review in analyzed.analysed() {
        let theme = review.theme.as_ref().unwrap();
        assert!(theme.cluster_id < partition.n_clusters);
        assert_eq!(theme.features.len(), partition.n_components);
        assert!(theme.distance >= 0.0);
    }
    Ok(())
}

#[test]
fn sentiment_labels_follow_compound_scores() -> Result<()> {
    let pipeline = Pipeline::new(PipelineConfig::default())?;
    let analyzed = pipeline.run(&corpus_batch())?;

    for review in analyzed.analysed() {
        let sentiment = review.sentiment.unwrap();
        assert!((-1.0..=1.0).contains(&sentiment.compound_score));
        assert_eq!(sentiment.label, SentimentLabel::from_score(sentiment.compound_score));
    }

    assert_eq!(
        analyzed.reviews[0].sentiment.unwrap().label,
        SentimentLabel::Positive
    );
    assert_eq!(
        analyzed.reviews[6].sentiment.unwrap().label,
        SentimentLabel::Negative
    );
    Ok(())
}

#[test]
fn three_review_batch_reduces_cluster_count() -> Result<()> {
    let pipeline = Pipeline::new(PipelineConfig::default())?;
    let batch = ReviewBatch::new(
        "tiny",
        reviews(&["transfer failed", "otp never arrives", "lovely design"]),
    );
    let analyzed = pipeline.run(&batch)?;

    let partition = &analyzed.summary.partitions[0];
    assert!(partition.n_clusters <= 3);
    assert!(analyzed.adjustments.iter().any(|a| matches!(
        a,
        Adjustment::DegenerateBatch {
            stage: ThemeStage::Clustering,
            requested: 10,
            effective,
            ..
        } if *effective == partition.n_clusters
    )));
    Ok(())
}

#[test]
fn identical_runs_produce_identical_output() -> Result<()> {
    let batch = corpus_batch();
    let first = Pipeline::new(PipelineConfig::default())?.run(&batch)?;
    let second = Pipeline::new(PipelineConfig::default())?.run(&batch)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn vocabulary_order_does_not_depend_on_document_order() -> Result<()> {
    let docs: Vec<Vec<String>> = vec![
        vec!["transfer".into(), "slow".into()],
        vec!["login".into(), "otp".into(), "slow".into()],
        vec!["crash".into(), "update".into()],
    ];
    let mut reversed = docs.clone();
    reversed.reverse();

    let vectorizer = TfIdfVectorizer::new(VectorizerConfig::default());
    let forward = vectorizer.fit_transform(&docs)?;
    let backward = vectorizer.fit_transform(&reversed)?;

    assert_eq!(forward.vocabulary, backward.vocabulary);
    let mut sorted = forward.vocabulary.clone();
    sorted.sort();
    assert_eq!(forward.vocabulary, sorted);
    Ok(())
}

#[test]
fn batch_of_only_empty_reviews_fails() {
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let batch = ReviewBatch::new("blank", reviews(&["", "???", "🙂"]));

    match pipeline.run(&batch) {
        Err(SentiscopeError::VocabularyEmpty {
            batch_id,
            batch_size,
            empty_reviews,
        }) => {
            assert_eq!(batch_id, "blank");
            assert_eq!(batch_size, 3);
            assert_eq!(empty_reviews, 3);
        }
        other => panic!("expected VocabularyEmpty, got {other:?}"),
    }
}

#[test]
fn per_bank_scope_fits_one_space_per_bank() -> Result<()> {
    let pipeline = Pipeline::new(PipelineConfig {
        theme_scope: ThemeScope::PerBank,
        ..PipelineConfig::default()
    })?;
    let analyzed = pipeline.run(&corpus_batch())?;

    let partitions: Vec<Option<Bank>> = analyzed
        .summary
        .partitions
        .iter()
        .map(|p| p.partition)
        .collect();
    assert_eq!(
        partitions,
        vec![Some(Bank::Cbe), Some(Bank::Boa), Some(Bank::Dashen)]
    );

    for partition in &analyzed.summary.partitions {
        let bank = partition.partition.unwrap();
        for review in analyzed.analysed().filter(|r| r.review.bank == bank) {
            assert!(review.cluster_id().unwrap() < partition.n_clusters);
        }
    }
    Ok(())
}

fn bank_review(text: &str, bank: Bank) -> Review {
    let date = NaiveDate::from_ymd_opt(2024, 8, 12).unwrap();
    Review::new(text, 3, date, bank, "Google Play Store").unwrap()
}

fn per_bank_min_df(min_df: usize) -> Result<Pipeline> {
    Pipeline::new(PipelineConfig {
        theme_scope: ThemeScope::PerBank,
        vectorizer: VectorizerConfig {
            min_df,
            ..VectorizerConfig::default()
        },
        ..PipelineConfig::default()
    })
}

#[test]
fn per_bank_partition_without_vocabulary_gets_a_single_theme() -> Result<()> {
    let batch = ReviewBatch::new(
        "b",
        vec![
            bank_review("transfer failed again", Bank::Cbe),
            bank_review("transfer slow again", Bank::Cbe),
            bank_review("login broken", Bank::Cbe),
            bank_review("dashboard looks lovely", Bank::Boa),
        ],
    );
    let analyzed = per_bank_min_df(2)?.run(&batch)?;

    assert_eq!(analyzed.len(), 4);
    assert!(analyzed.failed().next().is_none());

    let boa = &analyzed.reviews[3];
    let theme = boa.theme.as_ref().unwrap();
    assert_eq!(theme.cluster_id, 0);
    assert!(theme.features.is_empty());
    assert!(boa.sentiment.is_some());

    let boa_summary = analyzed
        .summary
        .partitions
        .iter()
        .find(|p| p.partition == Some(Bank::Boa))
        .unwrap();
    assert_eq!(boa_summary.vocabulary_size, 0);
    assert_eq!(boa_summary.n_clusters, 1);

    let cbe_summary = analyzed
        .summary
        .partitions
        .iter()
        .find(|p| p.partition == Some(Bank::Cbe))
        .unwrap();
    assert!(cbe_summary.vocabulary_size > 0);

    assert!(analyzed.adjustments.iter().any(|a| matches!(
        a,
        Adjustment::DegenerateBatch {
            stage: ThemeStage::Clustering,
            partition: Some(Bank::Boa),
            effective: 1,
            ..
        }
    )));
    Ok(())
}

#[test]
fn per_bank_batch_fails_only_when_no_partition_has_vocabulary() {
    let batch = ReviewBatch::new(
        "sparse",
        vec![
            bank_review("login broken", Bank::Cbe),
            bank_review("", Bank::Cbe),
            bank_review("dashboard looks lovely", Bank::Dashen),
        ],
    );

    match per_bank_min_df(2).unwrap().run(&batch) {
        Err(SentiscopeError::VocabularyEmpty {
            batch_id,
            batch_size,
            empty_reviews,
        }) => {
            assert_eq!(batch_id, "sparse");
            assert_eq!(batch_size, 3);
            assert_eq!(empty_reviews, 1);
        }
        other => panic!("expected VocabularyEmpty, got {other:?}"),
    }
}
