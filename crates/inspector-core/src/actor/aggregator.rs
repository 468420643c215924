//! `AggregatorActor`: collects finished host rows
//!
//! Owns the host -> row map exclusively; host tasks hand over complete rows
//! through its mailbox so no reader ever sees a partial row.

use std::collections::HashMap;
use std::mem;

use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tracing::{debug, warn};

use crate::column::Row;
use crate::error::CoreError;
use crate::message::{RecordRow, ResultAggregate, TakeAggregate};

/// Arguments for spawning an `AggregatorActor`
#[derive(Debug, Default)]
pub struct AggregatorActorArgs {
    /// Expected number of hosts, used to size the map
    pub expected_hosts: usize,
}

/// Collector for one inspection run
pub struct AggregatorActor {
    rows: HashMap<String, Row>,
}

impl Actor for AggregatorActor {
    type Args = AggregatorActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        debug!(id = %actor_ref.id(), expected = args.expected_hosts, "AggregatorActor starting");

        Ok(Self {
            rows: HashMap::with_capacity(args.expected_hosts),
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        if !self.rows.is_empty() {
            warn!(rows = self.rows.len(), "AggregatorActor stopped with undrained rows");
        }
        debug!(reason = ?reason, "AggregatorActor stopping");
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<RecordRow> for AggregatorActor {
    type Reply = Result<(), CoreError>;

    async fn handle(
        &mut self,
        msg: RecordRow,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if self.rows.contains_key(&msg.host) {
            return Err(CoreError::HostAlreadyRecorded(msg.host));
        }

        debug!(host = %msg.host, columns = msg.row.len(), "recorded row");
        self.rows.insert(msg.host, msg.row);
        Ok(())
    }
}

impl Message<TakeAggregate> for AggregatorActor {
    type Reply = ResultAggregate;

    async fn handle(
        &mut self,
        _msg: TakeAggregate,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        ResultAggregate::from_rows(mem::take(&mut self.rows))
    }
}
