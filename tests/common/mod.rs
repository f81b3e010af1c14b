//! Parsing for the whitespace-separated fixture files under
//! `tests/fixtures/`.
//!
//! Both formats start with a feasibility flag and the problem dimensions,
//! followed by the row-major matrices and vectors, and end with the
//! expected solution:
//!
//! ```text
//! lp_N.txt:  <feasible> <n> <ne> <ni> <f> <A> <b> <C> <d> <x>
//! qp_N.txt:  <feasible> <nv> <no> <ne> <ni> <Q> <r> <A> <b> <C> <d> <x>
//! ```

// Each integration-test binary compiles this module separately and only
// uses one of the two fixture kinds.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use faer::{Col, Mat};

pub struct LpFixture {
    pub feasible: bool,
    pub f: Col<f64>,
    pub a: Mat<f64>,
    pub b: Col<f64>,
    pub c: Mat<f64>,
    pub d: Col<f64>,
    pub x: Col<f64>,
}

pub struct QpFixture {
    pub feasible: bool,
    pub q: Mat<f64>,
    pub r: Col<f64>,
    pub a: Mat<f64>,
    pub b: Col<f64>,
    pub c: Mat<f64>,
    pub d: Col<f64>,
    pub x: Col<f64>,
}

struct Tokens {
    values: Vec<String>,
    next: usize,
}

impl Tokens {
    fn from_file(path: &Path) -> Self {
        let text = fs::read_to_string(path)
            .unwrap_or_else(|err| panic!("failed to read fixture {}: {err}", path.display()));
        Self {
            values: text.split_whitespace().map(str::to_owned).collect(),
            next: 0,
        }
    }

    fn word(&mut self) -> &str {
        let i = self.next;
        self.next += 1;
        &self.values[i]
    }

    fn usize(&mut self) -> usize {
        self.word().parse().expect("expected an integer token")
    }

    fn f64(&mut self) -> f64 {
        self.word().parse().expect("expected a float token")
    }

    fn col(&mut self, n: usize) -> Col<f64> {
        let mut v = Col::zeros(n);
        for i in 0..n {
            v[i] = self.f64();
        }
        v
    }

    fn mat(&mut self, rows: usize, cols: usize) -> Mat<f64> {
        let mut m = Mat::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                m[(i, j)] = self.f64();
            }
        }
        m
    }
}

pub fn load_lp(path: &Path) -> LpFixture {
    let mut tokens = Tokens::from_file(path);
    let feasible = tokens.word() == "True";
    let n = tokens.usize();
    let ne = tokens.usize();
    let ni = tokens.usize();
    LpFixture {
        feasible,
        f: tokens.col(n),
        a: tokens.mat(ne, n),
        b: tokens.col(ne),
        c: tokens.mat(ni, n),
        d: tokens.col(ni),
        x: tokens.col(n),
    }
}

pub fn load_qp(path: &Path) -> QpFixture {
    let mut tokens = Tokens::from_file(path);
    let feasible = tokens.word() == "True";
    let nv = tokens.usize();
    let no = tokens.usize();
    let ne = tokens.usize();
    let ni = tokens.usize();
    QpFixture {
        feasible,
        q: tokens.mat(no, nv),
        r: tokens.col(no),
        a: tokens.mat(ne, nv),
        b: tokens.col(ne),
        c: tokens.mat(ni, nv),
        d: tokens.col(ni),
        x: tokens.col(nv),
    }
}

/// All fixture files whose name starts with `prefix`, in name order.
pub fn fixture_paths(prefix: &str) -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .unwrap_or_else(|err| panic!("failed to list {}: {err}", dir.display()))
        .map(|entry| entry.expect("failed to read directory entry").path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix))
        })
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no fixtures named {prefix}* found");
    paths
}
