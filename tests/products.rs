//! Matrix-vector products checked against a dense reference

use approx::assert_relative_eq;
use chunksparse::{ChunkSparseMatrix, ChunkSparsityPattern, ParallelConfig};
use ndarray::{Array1, Array2};
use proptest::prelude::*;

/// Deterministic pseudo-random sparsity: roughly a third of the blocks plus the
/// block diagonal
fn create_pattern(rows: usize, cols: usize, chunk_size: usize) -> ChunkSparsityPattern {
    let mut pattern = ChunkSparsityPattern::new(rows, cols, chunk_size);
    let block_rows = (rows + chunk_size - 1) / chunk_size;
    let block_cols = (cols + chunk_size - 1) / chunk_size;

    for br in 0..block_rows {
        for bc in 0..block_cols {
            if br == bc || (br * 7 + bc * 3) % 3 == 0 {
                pattern.add_block(br, bc);
            }
        }
    }
    pattern.compress();
    pattern
}

/// Fills every stored real entry with a value derived from its position
fn fill_matrix(matrix: &mut ChunkSparseMatrix<'_, f64>) {
    let pattern = matrix.sparsity_pattern();
    for i in 0..pattern.n_rows() {
        for j in 0..pattern.n_cols() {
            if pattern.exists(i, j) {
                matrix.set(i, j, ((i * 13 + j * 7) % 11) as f64 - 5.0);
            }
        }
    }
}

fn vector(len: usize, seed: usize) -> Vec<f64> {
    (0..len).map(|i| ((i * 31 + seed) % 17) as f64 / 4.0 - 2.0).collect()
}

#[test]
fn test_vmult_matches_dense() {
    for &(rows, cols, cs) in &[(7, 7, 1), (7, 9, 2), (10, 6, 3), (12, 12, 4), (5, 5, 8)] {
        let pattern = create_pattern(rows, cols, cs);
        let mut matrix = ChunkSparseMatrix::<f64>::from_pattern(&pattern);
        fill_matrix(&mut matrix);

        let dense: Array2<f64> = matrix.to_dense();
        let src = vector(cols, 3);
        let expected = dense.dot(&Array1::from(src.clone()));

        let mut dst = vec![0.0; rows];
        matrix.vmult(&mut dst, &src);
        for (a, b) in dst.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_tvmult_matches_dense_transpose() {
    for &(rows, cols, cs) in &[(7, 9, 2), (10, 6, 3), (9, 4, 4)] {
        let pattern = create_pattern(rows, cols, cs);
        let mut matrix = ChunkSparseMatrix::<f64>::from_pattern(&pattern);
        fill_matrix(&mut matrix);

        let dense = matrix.to_dense();
        let src = vector(rows, 5);
        let expected = dense.t().dot(&Array1::from(src.clone()));

        let mut dst = vec![1.0; cols];
        matrix.tvmult_add(&mut dst, &src);
        for (a, b) in dst.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, b + 1.0, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_parallel_dispatch_matches_serial() {
    let pattern = create_pattern(301, 301, 3);
    let config = ParallelConfig {
        minimum_parallel_grain_size: 8,
        n_threads: 8,
    };
    let mut parallel = ChunkSparseMatrix::<f64>::with_config(config);
    parallel.reinit(&pattern);
    fill_matrix(&mut parallel);

    let mut serial = ChunkSparseMatrix::<f64>::with_config(ParallelConfig::sequential());
    serial.reinit(&pattern);
    serial.copy_from(&parallel);

    let src = vector(301, 11);
    let mut dst_parallel = vec![0.0; 301];
    let mut dst_serial = vec![0.0; 301];
    parallel.vmult(&mut dst_parallel, &src);
    serial.vmult(&mut dst_serial, &src);

    assert_eq!(dst_parallel, dst_serial);
}

#[test]
fn test_single_precision_matrix() {
    let pattern = create_pattern(6, 6, 4);
    let mut matrix = ChunkSparseMatrix::<f32>::from_pattern(&pattern);
    for i in 0..6 {
        matrix.set(i, i, 0.25);
    }

    let src = vec![4.0f64; 6];
    let mut dst = vec![0.0f64; 6];
    matrix.vmult(&mut dst, &src);
    assert_eq!(dst, vec![1.0; 6]);
}

fn scalar_product_case() -> impl Strategy<Value = (usize, usize, usize, Vec<f64>, Vec<f64>, Vec<f64>)> {
    (1usize..=4, 1usize..12, 1usize..12).prop_flat_map(|(cs, rows, cols)| {
        (
            Just(cs),
            Just(rows),
            Just(cols),
            proptest::collection::vec(-10.0f64..10.0, rows * cols),
            proptest::collection::vec(-10.0f64..10.0, rows),
            proptest::collection::vec(-10.0f64..10.0, cols),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// uᵀ·A·v agrees with the dense computation for every chunk size
    #[test]
    fn test_matrix_scalar_product_matches_dense(
        (cs, rows, cols, entries, u, v) in scalar_product_case()
    ) {
        let dense = Array2::from_shape_vec((rows, cols), entries).unwrap();

        let mut pattern = ChunkSparsityPattern::new(rows, cols, cs);
        for ((i, j), &value) in dense.indexed_iter() {
            if value.abs() > 5.0 {
                pattern.add(i, j);
            }
        }
        pattern.compress();

        let mut matrix = ChunkSparseMatrix::<f64>::from_pattern(&pattern);
        let sparse_dense = dense.mapv(|x| if x.abs() > 5.0 { x } else { 0.0 });
        matrix.copy_from_dense(sparse_dense.view());

        let expected = Array1::from(u.clone()).dot(&sparse_dense.dot(&Array1::from(v.clone())));
        let actual = matrix.matrix_scalar_product(&u, &v);

        prop_assert!((actual - expected).abs() <= 1e-9 * (1.0 + expected.abs()));
    }
}
