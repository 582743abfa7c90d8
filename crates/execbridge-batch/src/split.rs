//! Deterministic batch splitting (§4.4, "Batch splitting").

use execbridge_schemas::NewExecution;

/// Split `(index, row)` pairs into contiguous chunks of size `<= chunk_size`,
/// preserving input order. An empty input still produces one empty chunk so
/// downstream stages (C5's bulk-insert-with-fallback) see a uniform shape
/// regardless of whether any row validated.
pub fn split_into_batches(
    rows: Vec<(usize, NewExecution)>,
    chunk_size: usize,
) -> Vec<Vec<(usize, NewExecution)>> {
    let chunk_size = chunk_size.max(1);
    if rows.is_empty() {
        return vec![Vec::new()];
    }
    rows.chunks(chunk_size).map(|c| c.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use execbridge_schemas::{ExecutionStatus, TradeType};
    use rust_decimal_macros::dec;

    fn row() -> NewExecution {
        NewExecution {
            execution_status: ExecutionStatus::New,
            trade_type: TradeType::Buy,
            destination: "NYSE".into(),
            security_id: "A".repeat(24),
            quantity: dec!(1),
            limit_price: None,
            received_timestamp: chrono::Utc::now(),
            trade_service_execution_id: None,
            quantity_filled: dec!(0),
            average_price: None,
        }
    }

    #[test]
    fn splits_preserve_order_and_size() {
        let rows: Vec<_> = (0..7).map(|i| (i, row())).collect();
        let chunks = split_into_batches(rows, 3);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 3);
        assert_eq!(chunks[1].len(), 3);
        assert_eq!(chunks[2].len(), 1);
        assert_eq!(chunks[2][0].0, 6);
    }

    #[test]
    fn empty_input_yields_one_empty_chunk() {
        let chunks = split_into_batches(Vec::new(), 50);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_empty());
    }
}
