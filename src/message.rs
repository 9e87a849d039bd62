//! The two-kind, sender-tagged message protocol, and the wire codec used
//! when a message crosses a partition boundary.
//!
//! Each kind is valid in exactly one receiving phase: `WantsToBeInSet` is
//! produced by the lottery and consumed by conflict resolution; `IsInSet` is
//! produced by conflict resolution and consumed by edge cleaning. A message
//! sent in superstep S is delivered in S+1, so anything else on the wire is
//! a bug and is rejected by the compute function.

use std::io;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::graph::VertexId;

/// What a message announces about its sender.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// The sender won the lottery and bids for set membership.
    WantsToBeInSet,
    /// The sender is a confirmed member of this cycle's independent set.
    IsInSet,
}

/// A neighbor-to-neighbor message. Immutable after construction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Message {
    /// The vertex that sent the message.
    pub sender: VertexId,
    /// What the sender announces.
    pub kind: MessageKind,
}

impl Message {
    /// Constructs a message from `sender`.
    pub fn new(sender: VertexId, kind: MessageKind) -> Self {
        Message { sender, kind }
    }
}

/// Encodes a batch of addressed messages into a length-prefixed frame.
pub fn encode_batch(batch: &[(VertexId, Message)]) -> Result<Vec<u8>, Error> {
    let body = bincode::serialize(batch)?;
    let mut frame = Vec::with_capacity(4 + body.len());
    frame.write_u32::<BigEndian>(body.len() as u32)?;
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Decodes a frame produced by [`encode_batch`].
pub fn decode_batch(mut frame: &[u8]) -> Result<Vec<(VertexId, Message)>, Error> {
    let length = frame.read_u32::<BigEndian>()? as usize;
    if frame.len() < length {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated message batch").into());
    }
    Ok(bincode::deserialize(&frame[..length])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_survive_the_wire() {
        let batch: Vec<(VertexId, Message)> = vec![
            (2, Message::new(1, MessageKind::WantsToBeInSet)),
            (3, Message::new(1, MessageKind::WantsToBeInSet)),
            (1, Message::new(4, MessageKind::IsInSet)),
        ];
        let frame = encode_batch(&batch).unwrap();
        assert_eq!(decode_batch(&frame).unwrap(), batch);
    }

    #[test]
    fn truncated_frames_are_rejected() {
        let frame = encode_batch(&[(2, Message::new(1, MessageKind::IsInSet))]).unwrap();
        let err = decode_batch(&frame[..frame.len() - 1]).unwrap_err();
        assert!(matches!(err, Error::Frame(_)));
    }
}
