//! End-to-end cell-search scenario: the symbol selector recovers a
//! transmitted synchronization waveform from a synthetic sample stream, the
//! resolver locks to the cell identity and its published messages bring the
//! broadcast descrambler out of idle.

use common::stream::{ControlMessage, SoftBlock, SymbolBlock};
use common::types::CellId;
use layers::phy::pbch::PBCH_BLOCK_LEN;
use layers::phy::{Numerology, PbchDescrambler, PssGenerator, SssGenerator, SssResolver, SymbolSelector};
use num_complex::Complex32;

#[test]
fn test_symbol_selector_recovers_sync_sequence() {
    let num = Numerology::new(128);
    let pss = PssGenerator::new(1, 128);

    // PSS occupies the last symbol of slot 0 of the half-frame.
    let start = num.sym0_len + 5 * num.sym_len + num.cp_len;
    let mut stream = vec![Complex32::new(0.0, 0.0); 2 * num.slot_len];
    stream[start..start + 128].copy_from_slice(pss.time_sequence());

    let mut selector = SymbolSelector::new(128);
    let mut input = stream;
    let mut found = None;
    while let Some(block) = selector.process(&input) {
        input.clear();
        if block.source_offset == start as u64 {
            found = Some(block);
            break;
        }
    }

    let block = found.expect("sync symbol within two slots");
    assert_eq!(block.samples.as_slice(), pss.time_sequence());
}

#[test]
fn test_resolver_lock_feeds_descrambler() {
    let cell_id = CellId::from_parts(42, 1).unwrap();
    let generator = SssGenerator::new(cell_id);
    let symbol = SymbolBlock {
        samples: generator.symbol(false),
        source_offset: 4,
    };

    let mut resolver = SssResolver::new(128);
    resolver.push_message(ControlMessage::CellSubId(1));

    let mut published = Vec::new();
    for _ in 0..3 {
        published = resolver.process(&symbol).unwrap();
    }
    assert!(resolver.is_locked());
    assert_eq!(
        published,
        vec![
            ControlMessage::FrameStart(4),
            ControlMessage::CellId(CellId(127)),
        ]
    );
    assert!(resolver.process(&symbol).unwrap().is_empty());

    // The published messages drive the descrambler out of idle; it only
    // reacts to the cell identity.
    let mut descrambler = PbchDescrambler::new();
    let soft = SoftBlock::new(vec![1.0; PBCH_BLOCK_LEN], 0);
    assert_eq!(descrambler.process(&soft).unwrap(), None);
    for msg in published {
        descrambler.push_message(msg);
    }
    let out = descrambler.process(&soft).unwrap().expect("active");
    assert_eq!(descrambler.cell_id(), Some(CellId(127)));
    assert_eq!(out.values.len(), PBCH_BLOCK_LEN);
}
