//! Order-preserving chunking for batched external calls.


/// Split `items` into at most `n` ordered chunks covering every element once.
///
/// - `n < 2` yields a single chunk holding the whole input.
/// - When `len` divides evenly by `n`, all chunks have `len / n` elements.
/// - `balanced` and uneven: each chunk takes `ceil(remaining / chunks_left)`,
///   so larger chunks come first.
/// - Unbalanced and uneven: `n - 1` chunks of `len / (n - 1)` elements (one
///   less when that divides `len` exactly), then a final chunk with the rest.
///   If that size works out to zero the whole input becomes one chunk.
pub fn chunkify<T: Clone>(items: &[T], n: usize, balanced: bool) -> Vec<Vec<T>> {
    if n < 2 {
        return vec![items.to_vec()];
    }

    let len = items.len();
    let mut out = Vec::new();
    let mut i = 0;

    if len % n == 0 {
        let size = len / n;
        while i < len {
            out.push(items[i..i + size].to_vec());
            i += size;
        }
    } else if balanced {
        let mut chunks_left = n;
        while i < len {
            let size = (len - i).div_ceil(chunks_left);
            out.push(items[i..i + size].to_vec());
            i += size;
            chunks_left = chunks_left.saturating_sub(1).max(1);
        }
    } else {
        let n = n - 1;
        let mut size = len / n;
        if size > 0 && len % size == 0 {
            size -= 1;
        }
        while i < size * n {
            out.push(items[i..i + size].to_vec());
            i += size;
        }
        out.push(items[size * n..].to_vec());
    }

    out
}
