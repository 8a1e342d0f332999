pub mod gesture;
pub mod input;
pub mod session;
pub mod shortcuts;

pub use gesture::{CanvasAction, GestureMachine, GestureState};
pub use input::{Button, InputEvent, Modifiers};
pub use session::{Cursor, EditorSession};
pub use shortcuts::{ShortcutAction, ShortcutMap};
