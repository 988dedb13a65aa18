/// How an effect's output is combined with the frame underneath.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum BlendFunction {
    /// Alpha-weighted mix of effect over frame.
    #[default]
    Normal,
    /// `src + dst - src * dst`; never darkens.
    Screen,
    Add,
}

impl BlendFunction {
    pub(crate) fn to_wgpu(self) -> wgpu::BlendState {
        let color = match self {
            BlendFunction::Normal => wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            BlendFunction::Screen => wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::OneMinusDst,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            BlendFunction::Add => wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };
        wgpu::BlendState {
            color,
            // keep the frame's coverage
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Zero,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        }
    }
}
