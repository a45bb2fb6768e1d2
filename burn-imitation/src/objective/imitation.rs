use burn::prelude::*;

/// How squared action errors are reduced to a scalar loss.
#[derive(Config, Debug, PartialEq)]
pub enum LossReduction {
    /// Half the sum of squares over the whole batch.
    HalfSum,
    /// Mean of squares over every action component.
    Mean,
}

#[derive(Config)]
pub struct ImitationLossConfig {
    #[config(default = "LossReduction::HalfSum")]
    reduction: LossReduction,
}

impl ImitationLossConfig {
    pub fn init(&self) -> ImitationLoss {
        ImitationLoss {
            reduction: self.reduction.clone(),
        }
    }
}

/// Squared error between predicted and expert actions.
#[derive(Clone, Debug)]
pub struct ImitationLoss {
    reduction: LossReduction,
}

impl ImitationLoss {
    pub fn forward<B: Backend, const D: usize>(
        &self,
        predicted: Tensor<B, D>,
        expert: Tensor<B, D>,
    ) -> Tensor<B, 1> {
        let squared = (predicted - expert).powf_scalar(2.0);
        match self.reduction {
            LossReduction::HalfSum => squared.sum().mul_scalar(0.5),
            LossReduction::Mean => squared.mean(),
        }
    }
}
