use super::test_helpers::*;
use super::*;
use crate::config::JobConfig;
use crate::error::Error;
use crate::types::{Event, JobStatus};
use std::time::Duration;
