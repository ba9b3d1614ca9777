use crate::types::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub offset: Vec2,
    pub default_offset: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl Camera {
    pub fn new(default_offset: Vec2) -> Self {
        Self {
            offset: default_offset,
            default_offset,
        }
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset += Vec2::new(dx, dy);
    }

    pub fn return_to_origin(&mut self) -> Vec2 {
        let delta = self.offset - self.default_offset;
        self.offset -= delta;
        delta
    }

    pub fn center_on(&mut self, world: Vec2) {
        self.offset = self.default_offset - world;
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world + self.offset
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen - self.offset
    }

    pub fn is_at_origin(&self) -> bool {
        self.offset == self.default_offset
    }
}
