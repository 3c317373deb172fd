//! Entrypoint launch errors

use super::error_constructors;

error_constructors! {
    spawn_failed => SpawnFailed { command, reason };
}
