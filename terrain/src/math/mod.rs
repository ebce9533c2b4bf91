mod curvature;
mod steps;

pub(crate) use self::{
    curvature::{apparent_angle, earth_drop, incline},
    steps::{AdaptiveSteps, Step},
};
