//! Real-time scheduling helpers (Linux SCHED_FIFO / affinity / mlockall).
//!
//! Every step is best effort: a failure is logged and the display keeps
//! running with normal scheduling.

#[cfg(target_os = "linux")]
use crate::cli::RtLock;
use crate::cli::RtOpts;

#[cfg(target_os = "linux")]
/// Capacity of cpu_set_t in CPU indices (bits).
const MAX_CPUSET_BITS: usize = std::mem::size_of::<libc::cpu_set_t>() * 8;

#[cfg(target_os = "linux")]
pub fn setup_rt_once(opts: RtOpts) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !opts.enabled {
        return;
    }
    RT_ONCE.get_or_init(|| {
        match apply_mem_lock(opts.lock) {
            Ok(()) => tracing::info!(lock = ?opts.lock, "rt: memory lock applied"),
            Err(err) => tracing::warn!(error = %err, "rt: mlockall failed"),
        }
        match apply_fifo_priority(opts.prio) {
            Ok(prio) => tracing::info!(prio, "rt: SCHED_FIFO applied"),
            Err(err) => tracing::warn!(error = %err, "rt: sched_setscheduler failed"),
        }
        match apply_affinity(opts.cpu.unwrap_or(0)) {
            Ok(cpu) => tracing::info!(cpu, "rt: pinned"),
            Err(err) => tracing::warn!(error = %err, "rt: affinity not applied"),
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(opts: RtOpts) {
    if opts.enabled {
        tracing::warn!(lock = ?opts.lock, "rt: real-time mode is only supported on Linux");
    }
}

#[cfg(target_os = "linux")]
fn apply_mem_lock(lock: RtLock) -> eyre::Result<()> {
    use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};

    let flags = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => MCL_CURRENT,
        RtLock::All => MCL_CURRENT | MCL_FUTURE,
    };
    // SAFETY: mlockall takes plain flags and touches no caller memory.
    let rc = unsafe { mlockall(flags) };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if matches!(err.raw_os_error(), Some(code) if code == libc::EPERM || code == libc::ENOMEM) {
        eyre::bail!("{err}; hint: needs CAP_IPC_LOCK (or root) and a sufficient 'ulimit -l'");
    }
    Err(err.into())
}

/// Returns the priority actually applied, clamped to the system range.
#[cfg(target_os = "linux")]
fn apply_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param};

    // SAFETY: both calls only read the policy constant.
    let (min, max) = unsafe {
        (
            sched_get_priority_min(SCHED_FIFO),
            sched_get_priority_max(SCHED_FIFO),
        )
    };
    let (min, max) = if min < 0 || max < 0 { (1, 99) } else { (min, max) };
    let wanted = prio.unwrap_or(max).clamp(min, max);
    let param = sched_param {
        sched_priority: wanted,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling process.
    let rc = unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        eyre::bail!("{err}; hint: grant CAP_SYS_NICE or run as root");
    }
    Ok(wanted)
}

#[cfg(target_os = "linux")]
fn apply_affinity(cpu: usize) -> eyre::Result<usize> {
    use libc::{CPU_ISSET, CPU_SET, CPU_ZERO, cpu_set_t};

    if cpu >= MAX_CPUSET_BITS {
        eyre::bail!("requested CPU {cpu} exceeds cpu_set_t capacity {MAX_CPUSET_BITS}");
    }
    // SAFETY: sysconf has no memory side effects.
    let online = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if usize::try_from(online).map_or(true, |n| cpu >= n) {
        eyre::bail!("requested CPU {cpu} >= online {online}");
    }

    // SAFETY: cpu_set_t is plain data; zeroed is a valid empty set.
    let mut allowed: cpu_set_t = unsafe { std::mem::zeroed() };
    let rc = unsafe {
        CPU_ZERO(&mut allowed);
        libc::sched_getaffinity(0, std::mem::size_of::<cpu_set_t>(), &mut allowed)
    };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    if !unsafe { CPU_ISSET(cpu, &allowed) } {
        eyre::bail!("CPU {cpu} not permitted by current affinity mask");
    }

    let mut desired: cpu_set_t = unsafe { std::mem::zeroed() };
    let rc = unsafe {
        CPU_ZERO(&mut desired);
        CPU_SET(cpu, &mut desired);
        libc::sched_setaffinity(0, std::mem::size_of::<cpu_set_t>(), &desired)
    };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(cpu)
}
