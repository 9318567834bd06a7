pub(crate) mod pause;
pub(crate) mod play;
pub(crate) mod stop;

use crate::{CommandResult, Context};
