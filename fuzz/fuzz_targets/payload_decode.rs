//! Fuzz target for every inbound payload decoder
//!
//! Duplex frames, history bodies and compute bodies all come from the
//! network. Decoding arbitrary bytes must never panic; malformed input
//! returns an error or is classified as "not a chat message".

#![no_main]

use convoroom_proto::{ChatFrame, ComputeResponse, HistoryResponse, InboundFrame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = HistoryResponse::decode(data);
    let _ = ComputeResponse::decode(data);

    if let Ok(text) = std::str::from_utf8(data) {
        let classified = ChatFrame::classify(text);
        let parsed = InboundFrame::parse(text).ok().and_then(InboundFrame::into_chat);
        assert_eq!(classified, parsed);
    }
});
