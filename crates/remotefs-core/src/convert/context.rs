// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::types::{Context, Owner};
use remotefs_proto::messages as wire;

pub fn context_to_wire(ctx: Option<&Context>) -> Option<wire::Context> {
    ctx.map(|ctx| wire::Context {
        pid: ctx.pid,
        owner: ctx.owner.map(|o| wire::Owner {
            uid: o.uid,
            gid: o.gid,
        }),
    })
}

pub fn context_from_wire(ctx: Option<wire::Context>) -> Option<Context> {
    ctx.map(|ctx| Context {
        pid: ctx.pid,
        owner: ctx.owner.map(|o| Owner {
            uid: o.uid,
            gid: o.gid,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(ctx: Option<Context>) -> Option<Context> {
        context_from_wire(context_to_wire(ctx.as_ref()))
    }

    #[test]
    fn absent_stays_absent() {
        assert_eq!(context_to_wire(None), None);
        assert_eq!(round_trip(None), None);
    }

    #[test]
    fn ownerless_context_keeps_unset_owner() {
        let ctx = Context {
            pid: 99,
            owner: None,
        };
        assert_eq!(round_trip(Some(ctx)), Some(ctx));
    }

    #[test]
    fn root_owner_is_not_confused_with_unset() {
        let ctx = Context {
            pid: 1,
            owner: Some(Owner { uid: 0, gid: 0 }),
        };
        let back = round_trip(Some(ctx)).unwrap();
        assert_eq!(back.owner, Some(Owner { uid: 0, gid: 0 }));
    }

    #[test]
    fn full_context_round_trips() {
        let ctx = Context {
            pid: 4242,
            owner: Some(Owner {
                uid: 1000,
                gid: 1001,
            }),
        };
        assert_eq!(round_trip(Some(ctx)), Some(ctx));
    }
}
