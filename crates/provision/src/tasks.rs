//! Registry of provisioning tasks.
//!
//! Each task is a named group of shell commands with explicit prerequisite
//! tasks. The graph module turns the prerequisites into an execution order;
//! this module only declares what exists.

/// One named group of remote shell commands.
#[derive(Debug, Clone, Copy)]
pub struct Task {
    pub name: &'static str,
    pub summary: &'static str,
    /// Names of tasks that must run before this one.
    pub deps: &'static [&'static str],
    pub commands: &'static [&'static str],
}

/// All provisioning tasks, leaves first.
pub static TASKS: &[Task] = &[
    Task {
        name: "update-apt",
        summary: "Register package sources and refresh the apt index",
        deps: &[],
        commands: &[
            "curl -fsSL https://download.docker.com/linux/ubuntu/gpg | sudo apt-key add -",
            "sudo add-apt-repository \"deb [arch=amd64] https://download.docker.com/linux/ubuntu $(lsb_release -cs) stable\"",
            "apt-get update",
        ],
    },
    Task {
        name: "install-vim",
        summary: "Install vim",
        deps: &["update-apt"],
        commands: &["apt-get install -y vim-nox"],
    },
    Task {
        name: "install-python",
        summary: "Install python and pip",
        deps: &["update-apt"],
        commands: &[
            "apt-get -y install python3 python3-dev",
            "apt-get -y install python3-pip",
        ],
    },
    Task {
        name: "personalize",
        summary: "Install ntp and deploy dot files",
        deps: &["install-python", "install-vim"],
        commands: &[
            "sudo apt install -y ntp",
            "git clone https://github.com/robdmc/dot_files.git ~/dot_files",
            "(cd ~/dot_files/ && python3 deploy.py)",
        ],
    },
    Task {
        name: "install-conda",
        summary: "Install miniconda and activate it in the shell",
        deps: &[],
        commands: &[
            "wget --quiet https://repo.continuum.io/miniconda/Miniconda3-latest-Linux-x86_64.sh -O ~/miniconda.sh",
            "/bin/bash ~/miniconda.sh -b",
            "echo \". /root/miniconda3/bin/activate\" >> ~/.bashrc",
            "/root/miniconda3/bin/conda update -y conda",
        ],
    },
    Task {
        name: "initialize",
        summary: "Bring a freshly created droplet to a usable baseline",
        deps: &["personalize", "install-conda"],
        commands: &[],
    },
    Task {
        name: "install-docker",
        summary: "Install docker and docker-compose",
        deps: &["initialize"],
        commands: &[
            "sudo apt-get install -y docker-ce",
            "pip3 install docker-compose",
        ],
    },
    Task {
        name: "deploy",
        summary: "Full provisioning of the poller host",
        deps: &["install-docker"],
        commands: &[],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_dependency_names_a_registered_task() {
        for task in TASKS {
            for dep in task.deps {
                assert!(
                    TASKS.iter().any(|t| t.name == *dep),
                    "task '{}' depends on unknown '{dep}'",
                    task.name
                );
            }
        }
    }

    #[test]
    fn task_names_are_unique() {
        for (i, task) in TASKS.iter().enumerate() {
            assert!(
                TASKS.iter().skip(i + 1).all(|t| t.name != task.name),
                "duplicate task name '{}'",
                task.name
            );
        }
    }
}
