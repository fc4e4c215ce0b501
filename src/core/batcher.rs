use crate::domain::model::{Batch, VinRecord};
use crate::utils::error::Result;

pub const DEFAULT_CHUNK_SIZE: usize = 40;

/// Groups a record stream into batches of `chunk_size`; only the last may be short.
///
/// An error from the underlying stream is passed through and ends the iteration.
pub struct Batcher<I> {
    records: I,
    chunk_size: usize,
    next_index: usize,
    done: bool,
}

impl<I> Batcher<I>
where
    I: Iterator<Item = Result<VinRecord>>,
{
    pub fn new(records: I, chunk_size: usize) -> Self {
        Self {
            records,
            chunk_size: chunk_size.max(1),
            next_index: 0,
            done: false,
        }
    }
}

impl<I> Iterator for Batcher<I>
where
    I: Iterator<Item = Result<VinRecord>>,
{
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut records = Vec::with_capacity(self.chunk_size);
        while records.len() < self.chunk_size {
            match self.records.next() {
                Some(Ok(record)) => records.push(record),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if records.is_empty() {
            return None;
        }

        let batch = Batch {
            index: self.next_index,
            records,
        };
        self.next_index += 1;
        Some(Ok(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EtlError;

    fn vins(n: usize) -> Vec<Result<VinRecord>> {
        (0..n).map(|i| Ok(VinRecord::new(format!("VIN{:05}", i)))).collect()
    }

    #[test]
    fn test_batch_counts_and_order_are_preserved() {
        for n in [0usize, 1, 39, 40, 41, 80, 123] {
            let batches: Vec<Batch> = Batcher::new(vins(n).into_iter(), DEFAULT_CHUNK_SIZE)
                .collect::<Result<_>>()
                .unwrap();

            assert_eq!(batches.len(), n.div_ceil(DEFAULT_CHUNK_SIZE), "n = {}", n);

            for (i, batch) in batches.iter().enumerate() {
                assert_eq!(batch.index, i);
                assert!(!batch.is_empty());
                if i + 1 < batches.len() {
                    assert_eq!(batch.len(), DEFAULT_CHUNK_SIZE);
                }
            }

            let flattened: Vec<String> = batches.iter().flat_map(|b| b.vins()).collect();
            let expected: Vec<String> = (0..n).map(|i| format!("VIN{:05}", i)).collect();
            assert_eq!(flattened, expected);
        }
    }

    #[test]
    fn test_reader_error_stops_batching() {
        let mut input = vins(3);
        input.push(Err(EtlError::input("malformed CSV at line 5")));
        input.extend(vins(2));

        let mut batcher = Batcher::new(input.into_iter(), 10);
        assert!(matches!(batcher.next(), Some(Err(EtlError::InputError { .. }))));
        assert!(batcher.next().is_none());
    }

    #[test]
    fn test_small_chunks() {
        let sizes: Vec<usize> = Batcher::new(vins(5).into_iter(), 2)
            .map(|b| b.unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }
}
