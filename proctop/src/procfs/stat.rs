/// The fields of `/proc/<pid>/stat` the dashboard uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    pub utime: u64,
    pub stime: u64,
    pub num_threads: u32,
    pub vsize: u64,
}

impl Stat {
    /// Parses one stat line. The command name is enclosed in parentheses
    /// and may itself contain spaces and parentheses, so fields are counted
    /// from the last `)`.
    pub fn parse(line: &str) -> Result<Stat, String> {
        let open = line.find('(').ok_or("missing '('")?;
        let close = line.rfind(')').ok_or("missing ')'")?;
        if close < open {
            return Err("unbalanced command name".into());
        }
        let pid = line[..open]
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("pid: {e}"))?;
        let comm = line[open + 1..close].to_string();

        // Fields after the command, starting at field 3 (state).
        let rest: Vec<&str> = line[close + 1..].split_whitespace().collect();
        let field = |n: usize| -> Result<&str, String> {
            rest.get(n - 3)
                .copied()
                .ok_or_else(|| format!("field {n} missing"))
        };
        let number = |n: usize| -> Result<u64, String> {
            field(n)?
                .parse::<u64>()
                .map_err(|e| format!("field {n}: {e}"))
        };

        let state = field(3)?.chars().next().ok_or("empty state")?;
        Ok(Stat {
            pid,
            comm,
            state,
            utime: number(14)?,
            stime: number(15)?,
            num_threads: number(20)? as u32,
            vsize: number(23)?,
        })
    }

    pub fn cpu_ticks(&self) -> u64 {
        self.utime + self.stime
    }
}
