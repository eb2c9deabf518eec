use crate::command::Step;

pub struct Layout {
    pub build_dir: &'static str,
    pub shader_dir: &'static str,
    pub configure: Step,
    pub build: Step,
}

pub const CMAKE_CONFIGURE: Step = Step {
    program: "cmake",
    args: &[".."],
};

pub const MAKE: Step = Step {
    program: "make",
    args: &[],
};

pub const DEFAULT_LAYOUT: Layout = Layout {
    build_dir: "build",
    shader_dir: "res/glsl",
    configure: CMAKE_CONFIGURE,
    build: MAKE,
};
