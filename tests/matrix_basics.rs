//! Basic tests for chunked matrix storage, element access and row queries

use approx::assert_relative_eq;
use chunksparse::{ChunkSparseMatrix, ChunkSparsityPattern, IdentityMatrix};

/// Creates a 5×5 pattern with 2×2 chunks: tridiagonal blocks
fn create_padded_pattern() -> ChunkSparsityPattern {
    let mut pattern = ChunkSparsityPattern::new(5, 5, 2);
    for b in 0..3 {
        pattern.add_block(b, b);
        if b > 0 {
            pattern.add_block(b, b - 1);
        }
        if b < 2 {
            pattern.add_block(b, b + 1);
        }
    }
    pattern.compress();
    pattern
}

/// Checks that every padding cell of every stored chunk is zero
fn padding_is_zero(matrix: &ChunkSparseMatrix<'_, f64>) -> bool {
    let cs = matrix.sparsity_pattern().chunk_size();
    matrix.chunks().all(|chunk| {
        chunk
            .values
            .iter()
            .enumerate()
            .all(|(k, &v)| (k / cs < chunk.rows && k % cs < chunk.cols) || v == 0.0)
    })
}

#[test]
fn test_padding_stays_zero_under_set_and_add() {
    let pattern = create_padded_pattern();
    let mut matrix = ChunkSparseMatrix::<f64>::from_pattern(&pattern);

    for i in 0..5 {
        for j in 0..5 {
            if pattern.exists(i, j) {
                matrix.set(i, j, (i * 5 + j + 1) as f64);
                matrix.add(i, j, 0.5);
            }
        }
    }

    assert!(padding_is_zero(&matrix));
    assert_eq!(matrix.n_actually_nonzero_elements(), matrix.n_nonzero_elements());
}

#[test]
fn test_zero_assignment_clears_everything() {
    let pattern = create_padded_pattern();
    let mut matrix = ChunkSparseMatrix::<f64>::from_pattern(&pattern);
    matrix.set(0, 0, 1.0);
    matrix.set(4, 3, -2.0);
    assert_eq!(matrix.n_actually_nonzero_elements(), 2);

    matrix.assign_scalar(0.0);
    assert_eq!(matrix.n_actually_nonzero_elements(), 0);
}

#[test]
fn test_counts_exclude_padding() {
    let pattern = create_padded_pattern();
    let matrix = ChunkSparseMatrix::<f64>::from_pattern(&pattern);

    // 7 stored chunks; full 2×2 ones contribute 4, ones touching row/col 4 fewer
    // (0,0):4 (0,1):4 (1,0):4 (1,1):4 (1,2):2 (2,1):2 (2,2):1
    assert_eq!(matrix.n_nonzero_elements(), 21);
    assert_eq!(matrix.max_len(), 7 * 4);
}

#[test]
fn test_extract_row_copy_last_row() {
    let pattern = create_padded_pattern();
    let mut matrix = ChunkSparseMatrix::<f64>::from_pattern(&pattern);
    matrix.set(4, 2, 1.0);
    matrix.set(4, 3, 2.0);
    matrix.set(4, 4, 3.0);

    let mut columns = vec![0; 6];
    let mut values = vec![0.0; 6];
    let len = matrix.extract_row_copy(4, &mut columns, &mut values);

    assert_eq!(len, pattern.row_length(4));
    assert_eq!(&columns[..len], &[2, 3, 4]);
    assert_eq!(&values[..len], &[1.0, 2.0, 3.0]);
    assert!(columns[..len].iter().all(|&c| c < 5));
}

#[test]
fn test_copy_from_is_idempotent() {
    let pattern = create_padded_pattern();
    let mut source = ChunkSparseMatrix::<f64>::from_pattern(&pattern);
    source.assign_identity(&IdentityMatrix::new(5));
    source.set(3, 4, 7.0);

    let mut target = ChunkSparseMatrix::<f64>::from_pattern(&pattern);
    target.copy_from(&source);
    let first = target.values().to_vec();
    target.copy_from(&source);

    assert_eq!(target.values(), &first[..]);
    assert_eq!(target.values(), source.values());
}

#[test]
fn test_identity_product() {
    let pattern = create_padded_pattern();
    let id = IdentityMatrix::new(5);
    let matrix = ChunkSparseMatrix::<f64>::from_pattern_identity(&pattern, &id);

    let src = [1.0, -2.0, 3.0, -4.0, 5.0];
    let mut dst = [0.0; 5];
    matrix.vmult(&mut dst, &src);
    assert_eq!(dst, src);
}

#[test]
fn test_residual_example() {
    let mut pattern = ChunkSparsityPattern::new(4, 4, 2);
    pattern.add_block(0, 0);
    pattern.add_block(1, 1);
    pattern.compress();

    let mut matrix = ChunkSparseMatrix::<f64>::from_pattern(&pattern);
    matrix.block_mut(0, 0).unwrap().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
    matrix.block_mut(1, 1).unwrap().copy_from_slice(&[5.0, 6.0, 7.0, 8.0]);

    let u = [1.0; 4];
    let b = [1.0; 4];

    let mut product = [0.0; 4];
    matrix.vmult(&mut product, &u);
    assert_eq!(product, [3.0, 7.0, 11.0, 15.0]);

    let mut residual = [0.0; 4];
    let norm = matrix.residual(&mut residual, &u, &b);
    assert_eq!(residual, [-2.0, -6.0, -10.0, -14.0]);
    assert_relative_eq!(norm, 336.0f64.sqrt());
    assert_relative_eq!(norm, 16.37, epsilon = 1e-2);
}

#[test]
fn test_reattach_larger_pattern_grows_buffer() {
    let mut small = ChunkSparsityPattern::new(2, 2, 2);
    small.add_block(0, 0);
    small.compress();
    let large = create_padded_pattern();

    let mut matrix = ChunkSparseMatrix::<f64>::from_pattern(&small);
    assert_eq!(matrix.max_len(), 4);

    matrix.reinit(&large);
    assert_eq!(matrix.max_len(), 28);
    assert_eq!(matrix.n_rows(), 5);

    matrix.reinit(&small);
    assert_eq!(matrix.max_len(), 28);
    assert_eq!(matrix.n_rows(), 2);
}

#[test]
#[should_panic(expected = "no sparsity pattern attached")]
fn test_unattached_matrix_panics() {
    let matrix = ChunkSparseMatrix::<f64>::new();
    let mut dst = [0.0; 1];
    matrix.vmult(&mut dst, &[1.0]);
}
