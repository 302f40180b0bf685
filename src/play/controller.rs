//! 播放会话状态机
//!
//! 输入是每个节拍采样一次的原生运行标志。只有边沿才触发转换：
//! `true` 且上次为 `false` 时开始，`false` 且上次为 `true` 时停止。

use super::PlayGame;

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Running,
}

impl PlayState {
    pub fn is_running(&self) -> bool {
        matches!(self, PlayState::Running)
    }
}

/// 状态转换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayTransition {
    Started,
    Stopped,
}

/// 播放会话控制器
pub struct PlaySessionController {
    state: PlayState,
    game: Box<dyn PlayGame>,
    starts: u64,
    stops: u64,
}

impl PlaySessionController {
    pub fn new(game: Box<dyn PlayGame>) -> Self {
        Self {
            state: PlayState::Stopped,
            game,
            starts: 0,
            stops: 0,
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn starts(&self) -> u64 {
        self.starts
    }

    pub fn stops(&self) -> u64 {
        self.stops
    }

    /// 输入一次采样
    pub fn sample(&mut self, running: bool) -> Option<PlayTransition> {
        match (self.state, running) {
            (PlayState::Stopped, true) => {
                self.state = PlayState::Running;
                self.starts += 1;
                self.game.start();
                tracing::info!(target: "play", "Play session started");
                Some(PlayTransition::Started)
            }
            (PlayState::Running, false) => Some(self.enter_stopped()),
            _ => None,
        }
    }

    /// 运行期间转发节拍，停止时忽略
    pub fn tick(&mut self, delta_seconds: f32) -> bool {
        if !self.state.is_running() {
            return false;
        }
        self.game.tick(delta_seconds);
        true
    }

    /// 外部拆除时强制停止，保证开始/停止成对
    pub fn force_stop(&mut self) -> Option<PlayTransition> {
        if !self.state.is_running() {
            return None;
        }
        tracing::info!(target: "play", "Forcing play session stop");
        Some(self.enter_stopped())
    }

    fn enter_stopped(&mut self) -> PlayTransition {
        self.state = PlayState::Stopped;
        self.stops += 1;
        self.game.stop();
        tracing::info!(target: "play", "Play session stopped");
        PlayTransition::Stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{GameCall, RecordingGame};

    fn controller() -> (PlaySessionController, RecordingGame) {
        let game = RecordingGame::new();
        (PlaySessionController::new(Box::new(game.clone())), game)
    }

    #[test]
    fn test_edge_sequence() {
        let (mut controller, game) = controller();
        let samples = [false, false, true, true, false];
        let transitions: Vec<_> = samples.iter().map(|&s| controller.sample(s)).collect();

        assert_eq!(
            transitions,
            vec![
                None,
                None,
                Some(PlayTransition::Started),
                None,
                Some(PlayTransition::Stopped)
            ]
        );
        assert_eq!(game.calls(), vec![GameCall::Start, GameCall::Stop]);
        assert_eq!(controller.starts(), 1);
        assert_eq!(controller.stops(), 1);
    }

    #[test]
    fn test_ticks_only_while_running() {
        let (mut controller, game) = controller();
        assert!(!controller.tick(0.1));

        controller.sample(true);
        assert!(controller.tick(0.25));
        controller.sample(false);
        assert!(!controller.tick(0.1));

        assert_eq!(
            game.calls(),
            vec![GameCall::Start, GameCall::Tick(0.25), GameCall::Stop]
        );
    }

    #[test]
    fn test_force_stop_synthesizes_stop_once() {
        let (mut controller, game) = controller();
        assert_eq!(controller.force_stop(), None);

        controller.sample(true);
        assert_eq!(controller.force_stop(), Some(PlayTransition::Stopped));
        assert_eq!(controller.force_stop(), None);
        // 之后的 false 采样不会重复停止
        assert_eq!(controller.sample(false), None);

        assert_eq!(game.calls(), vec![GameCall::Start, GameCall::Stop]);
    }
}
