//! Shared fixtures for the integration tests

#![allow(dead_code)]

use asd_screen::config::ScreeningConfig;
use asd_screen::training::GradientBoostingConfig;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::path::{Path, PathBuf};

/// Shape of a synthetic screening CSV
#[derive(Debug, Clone)]
pub struct SyntheticCsv {
    pub rows: usize,
    pub seed: u64,
    /// Header written for the label column
    pub target_header: &'static str,
    /// Canonical columns left out of the file
    pub omit: Vec<&'static str>,
    /// Fixed share of positive rows; `None` labels rows by answer score
    pub positive_rate: Option<f64>,
}

impl Default for SyntheticCsv {
    fn default() -> Self {
        Self {
            rows: 240,
            seed: 7,
            target_header: "Class/ASD Traits ",
            omit: Vec::new(),
            positive_rate: None,
        }
    }
}

impl SyntheticCsv {
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_target_header(mut self, header: &'static str) -> Self {
        self.target_header = header;
        self
    }

    pub fn without(mut self, columns: &[&'static str]) -> Self {
        self.omit.extend_from_slice(columns);
        self
    }

    pub fn with_positive_rate(mut self, rate: f64) -> Self {
        self.positive_rate = Some(rate);
        self
    }

    /// Write the CSV into `dir` and return its path.
    ///
    /// Headers are deliberately messy (`" A1"`, `"age_mons "`) and labels
    /// use mixed casing.
    pub fn write(&self, dir: &Path) -> PathBuf {
        let headers: Vec<(&'static str, &'static str)> = vec![
            ("A1", " A1"),
            ("A2", "A2"),
            ("A3", "A3"),
            ("A4", "A4"),
            ("A5", "A5"),
            ("A6", "A6"),
            ("A7", "A7"),
            ("A8", "A8"),
            ("A9", "A9"),
            ("A10", "A10"),
            ("Age_Mons", "age_mons "),
            ("Sex", "Sex"),
            ("Jaundice", "Jaundice"),
            ("Family_mem_with_ASD", "Family_mem_with_ASD"),
        ];
        let kept: Vec<usize> = (0..headers.len())
            .filter(|&i| !self.omit.contains(&headers[i].0))
            .collect();

        let mut out = String::new();
        let mut header_line: Vec<&str> = kept.iter().map(|&i| headers[i].1).collect();
        header_line.push(self.target_header);
        out.push_str(&header_line.join(","));
        out.push('\n');

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let n_positive = self
            .positive_rate
            .map(|rate| (self.rows as f64 * rate).round() as usize);

        for row in 0..self.rows {
            let positive_hint = n_positive.map(|n| row < n);
            let answers: Vec<u8> = (0..10)
                .map(|_| match positive_hint {
                    Some(true) => u8::from(rng.gen_bool(0.8)),
                    Some(false) => u8::from(rng.gen_bool(0.2)),
                    None => rng.gen_range(0..2u8),
                })
                .collect();
            let score: u32 = answers.iter().map(|&a| u32::from(a)).sum();
            let positive = positive_hint.unwrap_or(score >= 5);

            let label = match (positive, row % 3) {
                (true, 0) => "YES",
                (true, 1) => "yes",
                (true, _) => "Yes",
                (false, 0) => "NO",
                (false, 1) => "no",
                (false, _) => "No",
            };

            let mut fields: Vec<String> = answers.iter().map(|a| a.to_string()).collect();
            fields.push(rng.gen_range(12..37u32).to_string());
            fields.push(if rng.gen_bool(0.5) { "m" } else { "f" }.to_string());
            fields.push(if rng.gen_bool(0.3) { "yes" } else { "no" }.to_string());
            fields.push(if rng.gen_bool(0.2) { "yes" } else { "no" }.to_string());

            let mut line: Vec<String> = kept.iter().map(|&i| fields[i].clone()).collect();
            line.push(label.to_string());
            out.push_str(&line.join(","));
            out.push('\n');
        }

        let path = dir.join("screening.csv");
        std::fs::write(&path, out).unwrap();
        path
    }
}

/// Small boosting setup that still separates the synthetic data cleanly
pub fn fast_boosting() -> GradientBoostingConfig {
    GradientBoostingConfig {
        n_estimators: 60,
        learning_rate: 0.2,
        max_depth: 3,
        ..Default::default()
    }
}

/// Configuration rooted in a temporary directory
pub fn test_config(dir: &Path, dataset: &Path) -> ScreeningConfig {
    ScreeningConfig::default()
        .with_model_dir(dir.join("models"))
        .with_dataset_path(dataset)
        .with_boosting(fast_boosting())
        .with_seed(42)
}
