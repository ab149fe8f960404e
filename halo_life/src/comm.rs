// comm.rs - Point-to-point and collective messaging between workers
//
// Every worker owns one Communicator. Workers share nothing but the channels:
// each rank holds a sender to every other rank and the receiving end of its
// own inbox. Receives match on (source, tag) and stash anything else that
// arrives first, so a fast neighbor can run a phase ahead without its
// messages being consumed by the wrong receive.

use std::collections::VecDeque;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::decomp::Direction;
use crate::error::{LifeError, LifeResult};

/// Rank that receives reductions and coordinates barriers.
pub const COORDINATOR: usize = 0;

/// Message kind, used for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Halo data travelling in the given direction.
    Halo(Direction),
    BarrierArrive,
    BarrierRelease,
    Reduce,
}

impl Tag {
    fn operation(self) -> &'static str {
        match self {
            Tag::Halo(Direction::North) => "halo northward",
            Tag::Halo(Direction::South) => "halo southward",
            Tag::Halo(Direction::East) => "halo eastward",
            Tag::Halo(Direction::West) => "halo westward",
            Tag::BarrierArrive | Tag::BarrierRelease => "barrier",
            Tag::Reduce => "reduce",
        }
    }
}

#[derive(Debug)]
struct Envelope {
    source: usize,
    tag: Tag,
    payload: Vec<u8>,
}

/// Builds the fully connected set of communicators for one run.
pub struct World;

impl World {
    pub fn create(size: usize) -> Vec<Communicator> {
        let (senders, inboxes): (Vec<_>, Vec<_>) = (0..size).map(|_| mpsc::unbounded_channel()).unzip();

        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| Communicator {
                rank,
                size,
                peers: senders
                    .iter()
                    .enumerate()
                    .map(|(peer, sender)| (peer != rank).then(|| sender.clone()))
                    .collect(),
                inbox,
                stash: VecDeque::new(),
            })
            .collect()
    }
}

/// Outcome of a buffered send. The payload was copied when the send was
/// issued; waiting only reports whether it reached the destination inbox.
#[must_use]
pub struct SendRequest(LifeResult<()>);

impl SendRequest {
    pub fn wait(self) -> LifeResult<()> {
        self.0
    }
}

/// A posted receive, completed by [`Communicator::wait`].
#[must_use]
#[derive(Debug, Clone, Copy)]
pub struct RecvRequest {
    source: usize,
    tag: Tag,
}

pub struct Communicator {
    rank: usize,
    size: usize,
    peers: Vec<Option<UnboundedSender<Envelope>>>,
    inbox: UnboundedReceiver<Envelope>,
    stash: VecDeque<Envelope>,
}

impl Communicator {
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Non-blocking send of `payload` to `dest`.
    pub fn isend(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> SendRequest {
        let envelope = Envelope { source: self.rank, tag, payload };
        let sent = match self.peers.get(dest) {
            Some(Some(sender)) => sender
                .send(envelope)
                .map_err(|_| LifeError::comm(self.rank, tag.operation(), format!("rank {dest} is gone"))),
            _ => Err(LifeError::comm(self.rank, tag.operation(), format!("no route to rank {dest}"))),
        };
        SendRequest(sent)
    }

    /// Posts a receive for the next message from `source` carrying `tag`.
    pub fn irecv(&self, source: usize, tag: Tag) -> RecvRequest {
        RecvRequest { source, tag }
    }

    /// Suspends until the posted receive is matched, returning its payload.
    pub async fn wait(&mut self, request: RecvRequest) -> LifeResult<Vec<u8>> {
        let RecvRequest { source, tag } = request;
        if let Some(position) = self.stash.iter().position(|e| e.source == source && e.tag == tag) {
            if let Some(envelope) = self.stash.remove(position) {
                return Ok(envelope.payload);
            }
        }

        loop {
            match self.inbox.recv().await {
                Some(envelope) if envelope.source == source && envelope.tag == tag => return Ok(envelope.payload),
                Some(envelope) => self.stash.push_back(envelope),
                None => {
                    return Err(LifeError::comm(
                        self.rank,
                        tag.operation(),
                        format!("all peers disconnected while waiting on rank {source}"),
                    ));
                }
            }
        }
    }

    /// Blocks until every rank has reached the barrier.
    pub async fn barrier(&mut self) -> LifeResult<()> {
        if self.rank == COORDINATOR {
            for peer in (0..self.size).filter(|&peer| peer != COORDINATOR) {
                let arrival = self.irecv(peer, Tag::BarrierArrive);
                self.wait(arrival).await?;
            }
            for peer in (0..self.size).filter(|&peer| peer != COORDINATOR) {
                self.isend(peer, Tag::BarrierRelease, Vec::new()).wait()?;
            }
        } else {
            self.isend(COORDINATOR, Tag::BarrierArrive, Vec::new()).wait()?;
            let release = self.irecv(COORDINATOR, Tag::BarrierRelease);
            self.wait(release).await?;
        }
        Ok(())
    }

    /// Sums `value` over all ranks. Only `root` gets `Some(total)`.
    pub async fn reduce_sum(&mut self, value: u64, root: usize) -> LifeResult<Option<u64>> {
        if self.rank != root {
            self.isend(root, Tag::Reduce, value.to_le_bytes().to_vec()).wait()?;
            return Ok(None);
        }

        let mut total = value;
        for peer in (0..self.size).filter(|&peer| peer != root) {
            let contribution = self.irecv(peer, Tag::Reduce);
            let payload = self.wait(contribution).await?;
            let bytes: [u8; 8] = payload.as_slice().try_into().map_err(|_| {
                LifeError::comm(self.rank, "reduce", format!("rank {peer} sent {} bytes", payload.len()))
            })?;
            total += u64::from_le_bytes(bytes);
        }
        Ok(Some(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receive_matches_source_and_tag() {
        let mut comms = World::create(3);
        let third = comms.pop().unwrap();
        let second = comms.pop().unwrap();
        let mut first = comms.pop().unwrap();

        third.isend(0, Tag::Halo(Direction::West), vec![3]).wait().unwrap();
        second.isend(0, Tag::Halo(Direction::North), vec![2, 2]).wait().unwrap();
        second.isend(0, Tag::Halo(Direction::West), vec![22]).wait().unwrap();

        let north = first.irecv(1, Tag::Halo(Direction::North));
        let from_third = first.irecv(2, Tag::Halo(Direction::West));
        let west = first.irecv(1, Tag::Halo(Direction::West));
        assert_eq!(first.wait(north).await.unwrap(), vec![2, 2]);
        assert_eq!(first.wait(west).await.unwrap(), vec![22]);
        assert_eq!(first.wait(from_third).await.unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn same_tag_keeps_send_order() {
        let mut comms = World::create(2);
        let mut second = comms.pop().unwrap();
        let first = comms.pop().unwrap();
        for value in 0..4u8 {
            first.isend(1, Tag::Halo(Direction::South), vec![value]).wait().unwrap();
        }
        for value in 0..4u8 {
            let request = second.irecv(0, Tag::Halo(Direction::South));
            assert_eq!(second.wait(request).await.unwrap(), vec![value]);
        }
    }

    #[tokio::test]
    async fn reduce_sums_at_root() {
        let comms = World::create(4);
        let handles: Vec<_> = comms
            .into_iter()
            .map(|mut comm| tokio::spawn(async move { comm.reduce_sum(comm.rank() as u64 + 1, COORDINATOR).await }))
            .collect();

        let mut totals = Vec::new();
        for handle in handles {
            totals.push(handle.await.unwrap().unwrap());
        }
        assert_eq!(totals, vec![Some(10), None, None, None]);
    }

    #[tokio::test]
    async fn barrier_releases_everyone() {
        let comms = World::create(3);
        let handles: Vec<_> = comms
            .into_iter()
            .map(|mut comm| tokio::spawn(async move { comm.barrier().await }))
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn send_to_dropped_peer_fails() {
        let mut comms = World::create(2);
        drop(comms.pop());
        let first = comms.pop().unwrap();
        let err = first.isend(1, Tag::Reduce, vec![1]).wait().unwrap_err();
        assert!(matches!(err, LifeError::Communication { rank: 0, .. }));
    }

    #[tokio::test]
    async fn receive_fails_when_every_peer_is_gone() {
        let mut comms = World::create(2);
        drop(comms.pop());
        let mut first = comms.pop().unwrap();
        let request = first.irecv(1, Tag::Halo(Direction::North));
        assert!(first.wait(request).await.is_err());
    }
}
