//! Truth-target movement integration.

use hecs::World;

use skywatch_core::constants::DT;
use skywatch_core::types::{Coordinate, GridFrame};

use crate::truth::{TruthTarget, TruthVelocity};

/// Integrate mobile truth targets by one tick, bouncing off world edges.
pub fn run(world: &mut World, frame: &GridFrame) {
    let width = frame.width_m();
    let height = frame.height_m();

    for (_entity, (target, pos, vel)) in
        world.query_mut::<(&TruthTarget, &mut Coordinate, &mut TruthVelocity)>()
    {
        if target.destroyed {
            continue;
        }
        pos.x += vel.x * DT;
        pos.y += vel.y * DT;

        if pos.x < 0.0 || pos.x > width {
            vel.x = -vel.x;
            pos.x = pos.x.clamp(0.0, width);
        }
        if pos.y < 0.0 || pos.y > height {
            vel.y = -vel.y;
            pos.y = pos.y.clamp(0.0, height);
        }
    }
}
