use {
    mach2::{
        kern_return::KERN_SUCCESS,
        mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t},
    },
    tracing::error,
};

pub(super) const NAME: &str = "mach_absolute_time";

/// `mach_absolute_time` reading taken at initialization,
/// with the timebase ratio converting absolute time units to nanoseconds.
#[derive(Debug)]
pub(super) struct Timebase {
    numer: u32,
    denom: u32,
    start: u64,
}

impl Timebase {
    pub(super) fn capture() -> Timebase {
        let mut info = mach_timebase_info_data_t { numer: 0, denom: 0 };

        let result = unsafe { mach_timebase_info(&mut info) };

        if result != KERN_SUCCESS || info.denom == 0 {
            error!(
                result,
                numer = info.numer,
                denom = info.denom,
                "mach_timebase_info failed"
            );
            panic!("mach_timebase_info failed: {}", result);
        }

        Timebase {
            numer: info.numer,
            denom: info.denom,
            start: unsafe { mach_absolute_time() },
        }
    }

    pub(super) fn elapsed_nanos(&self) -> u64 {
        let elapsed = unsafe { mach_absolute_time() }.saturating_sub(self.start);

        // Ratio applied to the difference in 128 bits: cannot overflow, stays monotone.
        (u128::from(elapsed) * u128::from(self.numer) / u128::from(self.denom)) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio() {
        let timebase = Timebase::capture();

        assert!(timebase.numer > 0);
        assert!(timebase.denom > 0);

        let a = timebase.elapsed_nanos();
        let b = timebase.elapsed_nanos();
        assert!(b >= a);
    }
}
