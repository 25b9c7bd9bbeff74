//! Dense weight matrices and the plastic update laws.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use rand::Rng;

use crate::schema::LearningRule;

/// Row-major weight matrix, one row per output sample.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl WeightMatrix {
    /// Zero matrix with `rows` outputs and `cols` inputs.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        Some(Self {
            rows: rows.len(),
            cols,
            data: rows.concat(),
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Fill with samples drawn uniformly from `[min, max)`.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R, min: f64, max: f64) {
        for w in &mut self.data {
            *w = rng.gen_range(min..max);
        }
    }

    /// `output = W * input`.
    pub fn project_into(&self, input: &[f64], output: &mut [f64]) {
        for (r, out) in output.iter_mut().enumerate().take(self.rows) {
            *out = self.row(r).iter().zip(input).map(|(w, x)| w * x).sum();
        }
    }

    /// Write as text: one row per line, values separated by spaces.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = io::BufWriter::new(fs::File::create(path)?);
        for r in 0..self.rows {
            let line: Vec<String> = self.row(r).iter().map(|w| w.to_string()).collect();
            writeln!(file, "{}", line.join(" "))?;
        }
        file.flush()
    }

    /// Read a matrix written by `write_to`. Blank lines are ignored.
    pub fn read_from<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        let rows = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                line.split_whitespace()
                    .map(str::parse::<f64>)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            })
            .collect::<io::Result<Vec<_>>>()?;

        Self::from_rows(&rows)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Ragged weight rows"))
    }
}

/// Update `weights` in place from pre-synaptic `pre` (length `cols`) and
/// post-synaptic `post` (length `rows`).
///
/// The delta rules compare `post` against the current prediction
/// `W * pre`, computed before any weight changes.
pub fn apply_learning_rule(
    rule: LearningRule,
    weights: &mut WeightMatrix,
    pre: &[f64],
    post: &[f64],
    rate: f64,
) {
    match rule {
        LearningRule::Hebb => {
            for (r, &y) in post.iter().enumerate() {
                for (c, &x) in pre.iter().enumerate() {
                    let w = weights.get(r, c);
                    weights.set(r, c, w + rate * x * y);
                }
            }
        }
        LearningRule::Oja => {
            for (r, &y) in post.iter().enumerate() {
                let decay = 1.0 - rate * y * y;
                for (c, &x) in pre.iter().enumerate() {
                    let w = weights.get(r, c);
                    weights.set(r, c, w * decay + rate * x * y);
                }
            }
        }
        LearningRule::DeltaWidrowHoff | LearningRule::DeltaKroghHertz => {
            let mut prediction = vec![0.0; weights.rows()];
            weights.project_into(pre, &mut prediction);

            for (r, (&y, &p)) in post.iter().zip(&prediction).enumerate() {
                let error = y - p;
                for (c, &x) in pre.iter().enumerate() {
                    let w = weights.get(r, c);
                    let delta = match rule {
                        LearningRule::DeltaKroghHertz => rate * (error - rate * w) * x,
                        _ => rate * error * x,
                    };
                    weights.set(r, c, w + delta);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::tempdir;

    fn matrix(rows: &[&[f64]]) -> WeightMatrix {
        WeightMatrix::from_rows(&rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>()).unwrap()
    }

    #[test]
    fn test_projection() {
        let w = matrix(&[&[1.0, 2.0, 3.0], &[0.0, -1.0, 0.5]]);
        let mut out = [0.0; 2];
        w.project_into(&[1.0, 1.0, 2.0], &mut out);
        assert_eq!(out, [9.0, 0.0]);
    }

    #[test]
    fn test_hebb() {
        let mut w = WeightMatrix::zeros(2, 2);
        apply_learning_rule(LearningRule::Hebb, &mut w, &[1.0, 2.0], &[3.0, 0.0], 0.5);
        assert_eq!(w, matrix(&[&[1.5, 3.0], &[0.0, 0.0]]));
    }

    #[test]
    fn test_oja() {
        let mut w = matrix(&[&[1.0, 1.0]]);
        apply_learning_rule(LearningRule::Oja, &mut w, &[1.0, 0.0], &[2.0], 0.1);
        // w * (1 - 0.1 * 4) + 0.1 * pre * 2
        assert!((w.get(0, 0) - (0.6 + 0.2)).abs() < 1e-12);
        assert!((w.get(0, 1) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_widrow_hoff() {
        let mut w = matrix(&[&[0.5, 0.5]]);
        // prediction = 1.5, error = 0.5
        apply_learning_rule(LearningRule::DeltaWidrowHoff, &mut w, &[1.0, 2.0], &[2.0], 0.1);
        assert!((w.get(0, 0) - 0.55).abs() < 1e-12);
        assert!((w.get(0, 1) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_krogh_hertz() {
        let mut w = matrix(&[&[0.5, 0.5]]);
        // error = 0.5, delta = 0.1 * (0.5 - 0.1 * 0.5) * pre
        apply_learning_rule(LearningRule::DeltaKroghHertz, &mut w, &[1.0, 2.0], &[2.0], 0.1);
        assert!((w.get(0, 0) - (0.5 + 0.045)).abs() < 1e-12);
        assert!((w.get(0, 1) - (0.5 + 0.09)).abs() < 1e-12);
    }

    #[test]
    fn test_delta_converges() {
        let mut w = WeightMatrix::zeros(1, 2);
        for _ in 0..500 {
            apply_learning_rule(LearningRule::DeltaWidrowHoff, &mut w, &[1.0, 0.0], &[3.0], 0.1);
        }
        assert!((w.get(0, 0) - 3.0).abs() < 1e-6);
        assert_eq!(w.get(0, 1), 0.0);
    }

    #[test]
    fn test_text_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("weights.txt");

        let mut w = WeightMatrix::zeros(3, 4);
        w.randomize(&mut StdRng::seed_from_u64(7), -1.0, 1.0);
        w.write_to(&path).unwrap();

        let loaded = WeightMatrix::read_from(&path).unwrap();
        assert_eq!(loaded, w);
    }

    #[test]
    fn test_read_rejects_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weights.txt");

        std::fs::write(&path, "1 2 3\n4 5\n").unwrap();
        let err = WeightMatrix::read_from(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        std::fs::write(&path, "1 two 3\n").unwrap();
        assert!(WeightMatrix::read_from(&path).is_err());

        assert!(WeightMatrix::read_from(dir.path().join("missing.txt")).is_err());
    }
}
